use crate::adapters::http::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::config::toml_config::TomlConfig;
use crate::core::currency::DEFAULT_CURRENCY;
use crate::core::listing::DEFAULT_PAGE_SIZE;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{PriceBoardError, Result};
use crate::utils::validation::{
    is_currency_code, validate_path, validate_positive_number, validate_url, Validate,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Effective settings after defaults, the TOML file and CLI flags are layered.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub timeout: Duration,
    pub auth_token: Option<String>,
    pub page_size: usize,
    pub data_dir: PathBuf,
    pub default_currency: String,
    pub json_logs: bool,
    pub verbose: bool,
}

pub fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".price-board")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            auth_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            data_dir: default_data_dir(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            json_logs: false,
            verbose: false,
        }
    }
}

impl Settings {
    /// Values present in the file override the defaults.
    pub fn apply_toml(mut self, file: &TomlConfig) -> Self {
        if let Some(url) = file.base_url() {
            self.api_base_url = url.to_string();
        }
        if let Some(secs) = file.timeout_seconds() {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(token) = file.auth_token() {
            self.auth_token = Some(token.to_string());
        }
        if let Some(page_size) = file.page_size() {
            self.page_size = page_size;
        }
        if let Some(dir) = file.data_dir() {
            self.data_dir = dir.to_path_buf();
        }
        if let Some(currency) = file.default_currency() {
            self.default_currency = currency.trim().to_ascii_uppercase();
        }
        self.json_logs |= file.json_logs();
        self.verbose |= file.verbose();
        self
    }
}

impl ConfigProvider for Settings {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }

    fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("api_url", &self.api_base_url)?;
        validate_positive_number("page_size", self.page_size, 1)?;
        validate_positive_number("timeout_secs", self.timeout.as_secs() as usize, 1)?;
        validate_path("data_dir", &self.data_dir.to_string_lossy())?;

        if !is_currency_code(&self.default_currency) {
            return Err(PriceBoardError::InvalidConfigValueError {
                field: "currency".to_string(),
                value: self.default_currency.clone(),
                reason: "Expected a three-letter currency code such as USD".to_string(),
            });
        }
        Ok(())
    }
}
