use crate::config::settings::Settings;
use crate::config::toml_config::TomlConfig;
use crate::core::listing::{ListingFilters, DEFAULT_MAX_PRICE, DEFAULT_MIN_PRICE};
use crate::domain::model::{EntryType, SortKey};
use crate::utils::error::{PriceBoardError, Result};
use crate::utils::validation::{is_currency_code, validate_positive_number, validate_range, Validate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "price-board")]
#[command(about = "Browse, submit and moderate crowdsourced prices")]
pub struct CliConfig {
    /// Base URL of the marketplace API
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Bearer token for admin endpoints
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// TOML config file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where the selected currency and cached location are kept
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Currency for this run instead of the saved preference
    #[arg(long, global = true)]
    pub currency: Option<String>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List approved prices with optional search and filters
    Browse(BrowseArgs),
    /// Interactive browse: type to search, `:more` to load the next page
    Watch(BrowseArgs),
    /// Submit a new price for review
    Submit(SubmitArgs),
    /// Show one entry
    Show { id: String },
    /// Show submissions waiting for review
    Pending,
    /// Approve a pending submission
    Approve { id: String },
    /// Reject (delete) a pending submission
    Reject { id: String },
    /// List categories, or create one with --add
    Categories {
        #[arg(long)]
        add: Option<String>,
    },
    Countries,
    /// List currencies, or persist the preferred one with --set
    Currencies {
        #[arg(long)]
        set: Option<String>,
    },
    Convert {
        amount: f64,
        from: String,
        to: Option<String>,
    },
    /// Show the detected location (cached for an hour), or set it by hand
    Location {
        #[arg(long, conflicts_with = "city")]
        refresh: bool,
        #[arg(long, requires_all = ["country", "country_code"])]
        city: Option<String>,
        #[arg(long, requires = "city")]
        country: Option<String>,
        #[arg(long, requires = "city")]
        country_code: Option<String>,
        #[arg(long = "suggested-currency", requires = "city")]
        suggested_currency: Option<String>,
    },
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Args)]
pub struct BrowseArgs {
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long = "type")]
    pub entry_type: Option<EntryType>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long, default_value_t = DEFAULT_MIN_PRICE)]
    pub min_price: f64,

    #[arg(long, default_value_t = DEFAULT_MAX_PRICE)]
    pub max_price: f64,

    #[arg(long, default_value = "newest")]
    pub sort: SortKey,

    /// Number of pages to fetch ("load more" this many times minus one)
    #[arg(long, default_value = "1")]
    pub pages: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl BrowseArgs {
    pub fn filters(&self) -> ListingFilters {
        ListingFilters {
            entry_type: self.entry_type,
            category: self.category.clone().unwrap_or_default(),
            country: self.country.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            min_price: self.min_price,
            max_price: self.max_price,
            sort: self.sort,
        }
    }
}

impl Validate for BrowseArgs {
    fn validate(&self) -> Result<()> {
        validate_range("min_price", self.min_price, DEFAULT_MIN_PRICE, DEFAULT_MAX_PRICE)?;
        validate_range("max_price", self.max_price, DEFAULT_MIN_PRICE, DEFAULT_MAX_PRICE)?;
        validate_positive_number("pages", self.pages, 1)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long = "type", default_value = "product")]
    pub entry_type: EntryType,

    #[arg(long)]
    pub category: String,

    /// Price as typed; checked before anything is sent
    #[arg(long)]
    pub price: String,

    #[arg(long)]
    pub vendor: String,

    /// Defaults to the detected location
    #[arg(long)]
    pub country: Option<String>,

    /// Defaults to the detected location
    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub link: Option<String>,

    /// Do not wait before returning after a successful submission
    #[arg(long)]
    pub no_wait: bool,
}

impl CliConfig {
    /// Defaults, then the TOML file, then flags. The result is validated.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(path) = &self.config {
            let file = TomlConfig::from_file(path)?;
            file.validate()?;
            settings = settings.apply_toml(&file);
        }

        if let Some(url) = &self.api_url {
            settings.api_base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(token) = &self.token {
            settings.auth_token = Some(token.clone());
        }
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(page_size) = self.page_size {
            settings.page_size = page_size;
        }
        settings.verbose |= self.verbose;
        settings.json_logs |= self.json_logs;

        settings.validate()?;
        Ok(settings)
    }

    /// The `--currency` override, upper-cased and checked.
    pub fn currency_override(&self) -> Result<Option<String>> {
        let Some(raw) = &self.currency else {
            return Ok(None);
        };
        let code = raw.trim().to_ascii_uppercase();
        if !is_currency_code(&code) {
            return Err(PriceBoardError::InvalidConfigValueError {
                field: "currency".to_string(),
                value: raw.clone(),
                reason: "Expected a three-letter currency code such as USD".to_string(),
            });
        }
        Ok(Some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_browse_with_filters() {
        let cli = CliConfig::try_parse_from([
            "price-board",
            "browse",
            "--search",
            "laptop",
            "--type",
            "product",
            "--country",
            "Germany",
            "--max-price",
            "500",
            "--sort",
            "price",
            "--format",
            "csv",
        ])
        .unwrap();

        let Command::Browse(args) = cli.command else {
            panic!("expected browse");
        };
        let filters = args.filters();
        assert_eq!(filters.entry_type, Some(EntryType::Product));
        assert_eq!(filters.country, "Germany");
        assert_eq!(filters.max_price, 500.0);
        assert_eq!(filters.min_price, 0.0);
        assert_eq!(filters.sort, SortKey::Price);
        assert_eq!(args.format, OutputFormat::Csv);
        assert_eq!(args.search.as_deref(), Some("laptop"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = CliConfig::try_parse_from([
            "price-board",
            "pending",
            "--api-url",
            "https://prices.example.com/api",
            "--token",
            "abc",
        ])
        .unwrap();

        let settings = cli.settings().unwrap();
        assert_eq!(settings.api_base_url, "https://prices.example.com/api");
        assert_eq!(settings.auth_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_invalid_api_url_is_rejected() {
        let cli =
            CliConfig::try_parse_from(["price-board", "health", "--api-url", "nope"]).unwrap();
        assert!(cli.settings().is_err());
    }

    #[test]
    fn test_browse_price_bounds() {
        let cli = CliConfig::try_parse_from(["price-board", "browse", "--max-price", "2000"])
            .unwrap();
        let Command::Browse(args) = cli.command else {
            panic!("expected browse");
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_currency_override_is_normalized() {
        let cli =
            CliConfig::try_parse_from(["price-board", "categories", "--currency", "eur"]).unwrap();
        assert_eq!(cli.currency_override().unwrap().as_deref(), Some("EUR"));

        let cli =
            CliConfig::try_parse_from(["price-board", "categories", "--currency", "euro"]).unwrap();
        assert!(cli.currency_override().is_err());
    }

    #[test]
    fn test_manual_location_needs_all_parts() {
        let result = CliConfig::try_parse_from(["price-board", "location", "--city", "Porto"]);
        assert!(result.is_err());

        let cli = CliConfig::try_parse_from([
            "price-board",
            "location",
            "--city",
            "Porto",
            "--country",
            "Portugal",
            "--country-code",
            "PT",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Location { city: Some(_), .. }));
    }

    #[test]
    fn test_unknown_type_is_a_parse_error() {
        let result = CliConfig::try_parse_from(["price-board", "browse", "--type", "gadget"]);
        assert!(result.is_err());
    }
}
