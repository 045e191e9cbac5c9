use crate::utils::error::{PriceBoardError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_required_field,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: Option<ApiSection>,
    pub listing: Option<ListingSection>,
    pub storage: Option<StorageSection>,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingSection {
    pub page_size: Option<usize>,
    pub default_currency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid"))
}

fn unresolved(value: &str) -> bool {
    env_var_pattern().is_match(value)
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        tracing::debug!("⚙️ Loaded config file {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${PRICE_BOARD_TOKEN})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures<'_>| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.api.as_ref()?.base_url.as_deref()
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.api.as_ref()?.timeout_seconds
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.api.as_ref()?.auth_token.as_deref()
    }

    pub fn page_size(&self) -> Option<usize> {
        self.listing.as_ref()?.page_size
    }

    pub fn default_currency(&self) -> Option<&str> {
        self.listing.as_ref()?.default_currency.as_deref()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.storage.as_ref()?.data_dir.as_deref()
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(api) = &self.api {
            let base_url = validate_required_field("api.base_url", &api.base_url)?;
            validate_url("api.base_url", base_url)?;

            if let Some(timeout) = api.timeout_seconds {
                validate_positive_number("api.timeout_seconds", timeout as usize, 1)?;
            }

            if let Some(token) = &api.auth_token {
                if unresolved(token) {
                    return Err(PriceBoardError::MissingConfigError {
                        field: format!("api.auth_token (environment variable in {})", token),
                    });
                }
            }
        }

        if let Some(page_size) = self.page_size() {
            validate_positive_number("listing.page_size", page_size, 1)?;
        }

        if let Some(currency) = self.default_currency() {
            validate_non_empty_string("listing.default_currency", currency)?;
        }

        if let Some(dir) = self.data_dir() {
            validate_path("storage.data_dir", &dir.to_string_lossy())?;
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[api]
base_url = "https://prices.example.com/api"
timeout_seconds = 5

[listing]
page_size = 50
default_currency = "EUR"

[storage]
data_dir = "/tmp/price-board"

[logging]
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.base_url(), Some("https://prices.example.com/api"));
        assert_eq!(config.timeout_seconds(), Some(5));
        assert_eq!(config.page_size(), Some(50));
        assert_eq!(config.default_currency(), Some("EUR"));
        assert_eq!(config.data_dir(), Some(Path::new("/tmp/price-board")));
        assert!(config.json_logs());
        assert!(!config.verbose());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.base_url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PRICE_BOARD_TEST_TOKEN", "s3cret");

        let toml_content = r#"
[api]
base_url = "https://prices.example.com/api"
auth_token = "${PRICE_BOARD_TEST_TOKEN}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.auth_token(), Some("s3cret"));

        std::env::remove_var("PRICE_BOARD_TEST_TOKEN");
    }

    #[test]
    fn test_unresolved_token_fails_validation() {
        let toml_content = r#"
[api]
base_url = "https://prices.example.com/api"
auth_token = "${PRICE_BOARD_SURELY_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PriceBoardError::MissingConfigError { .. }));
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
base_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            r#"
[api]
timeout_seconds = 3
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            PriceBoardError::MissingConfigError { .. }
        ));

        let config = TomlConfig::from_toml_str(
            r#"
[listing]
page_size = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[api]
base_url = "http://localhost:5001/api"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.base_url(), Some("http://localhost:5001/api"));
    }
}
