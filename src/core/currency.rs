use crate::domain::model::{ConversionRequest, Currency};
use crate::domain::ports::{PreferenceStore, PriceApi};
use crate::utils::error::{PriceBoardError, Result};
use crate::utils::validation::is_currency_code;

pub const SELECTED_CURRENCY_KEY: &str = "selected_currency";
pub const DEFAULT_CURRENCY: &str = "USD";

/// Offered when the server's currency list cannot be loaded.
pub fn fallback_currencies() -> Vec<Currency> {
    vec![
        Currency::new("USD", "US Dollar", "$"),
        Currency::new("EUR", "Euro", "€"),
        Currency::new("GBP", "British Pound", "£"),
        Currency::new("JPY", "Japanese Yen", "¥"),
    ]
}

/// Available currencies plus the user's persisted choice.
#[derive(Debug)]
pub struct CurrencyPreferences<S: PreferenceStore> {
    store: S,
    currencies: Vec<Currency>,
    selected: String,
    error: Option<String>,
}

impl<S: PreferenceStore> CurrencyPreferences<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            currencies: Vec::new(),
            selected: DEFAULT_CURRENCY.to_string(),
            error: None,
        }
    }

    /// Selection used until a saved one is restored.
    pub fn with_default(mut self, code: &str) -> Self {
        self.selected = code.to_string();
        self
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Loads the server list (or the fallback list) and restores the saved selection.
    pub async fn load<A: PriceApi + ?Sized>(&mut self, api: &A) {
        self.error = None;
        match api.currencies().await {
            Ok(currencies) => self.currencies = currencies,
            Err(e) => {
                tracing::warn!("🔶 Error fetching currencies, using fallback list: {}", e);
                self.error = Some(e.user_friendly_message());
                self.currencies = fallback_currencies();
            }
        }

        self.restore_selection().await;
    }

    /// Reads the persisted selection without touching the network.
    pub async fn restore_selection(&mut self) {
        match self.saved_selection().await {
            Ok(Some(code)) => self.selected = code,
            Ok(None) => {}
            Err(e) => tracing::warn!("🔶 Could not read saved currency: {}", e),
        }
    }

    async fn saved_selection(&self) -> Result<Option<String>> {
        let Some(raw) = self.store.read(SELECTED_CURRENCY_KEY).await? else {
            return Ok(None);
        };
        // 舊版直接存純文字，兩種都接受
        let code = serde_json::from_slice::<String>(&raw)
            .unwrap_or_else(|_| String::from_utf8_lossy(&raw).trim().to_string());
        Ok(is_currency_code(&code).then_some(code))
    }

    pub async fn select(&mut self, code: &str) -> Result<()> {
        let code = code.trim().to_ascii_uppercase();
        if !is_currency_code(&code) {
            return Err(PriceBoardError::validation(format!(
                "'{}' is not a currency code",
                code
            )));
        }

        let data = serde_json::to_vec(&code)?;
        self.store.write(SELECTED_CURRENCY_KEY, &data).await?;
        tracing::info!("💱 Prices will be shown in {}", code);
        self.selected = code;
        Ok(())
    }

    /// Symbol from the loaded list, falling back to the code itself.
    pub fn symbol_for<'a>(&'a self, code: &'a str) -> &'a str {
        self.currencies
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.symbol.as_str())
            .unwrap_or(code)
    }

    /// Converts `amount` into `to` (the selected currency when `None`).
    /// Any failure yields the original amount.
    pub async fn convert<A: PriceApi + ?Sized>(
        &self,
        api: &A,
        amount: f64,
        from: &str,
        to: Option<&str>,
    ) -> f64 {
        let to = to.unwrap_or(&self.selected);
        if from == to {
            return amount;
        }

        let request = ConversionRequest {
            amount,
            from_currency: from.to_string(),
            to_currency: to.to_string(),
        };
        match api.convert_currency(&request).await {
            Ok(conversion) => conversion.converted_amount,
            Err(e) => {
                tracing::warn!("🔶 Error converting {} {} to {}: {}", amount, from, to, e);
                amount
            }
        }
    }
}
