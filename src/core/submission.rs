use crate::domain::model::{EntryType, Listing, Location, NewEntry};
use crate::domain::ports::PriceApi;
use crate::utils::error::PriceBoardError;
use crate::utils::validation::{is_currency_code, is_valid_url, parse_positive_price};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Pause between the confirmation and returning to the browse view.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(3);

const GENERIC_SUBMIT_ERROR: &str = "Failed to submit entry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Type,
    Category,
    Price,
    Currency,
    Vendor,
    Country,
    City,
    Link,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Type => "type",
            Self::Category => "category",
            Self::Price => "price",
            Self::Currency => "currency",
            Self::Vendor => "vendor",
            Self::Country => "country",
            Self::City => "city",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type FieldErrors = BTreeMap<FormField, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Local validation failed; nothing was sent.
    Invalid(FieldErrors),
    Submitted {
        entry: Listing,
        redirect_after: Duration,
    },
    Failed {
        message: String,
    },
}

/// Raw field values of the "submit a price" form.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionForm {
    pub name: String,
    pub entry_type: EntryType,
    pub category: String,
    pub price: String,
    pub currency: String,
    pub vendor: String,
    pub country: String,
    pub city: String,
    pub link: String,
    errors: FieldErrors,
    error: Option<String>,
    default_currency: String,
    location: Option<Location>,
    known_currencies: Vec<String>,
}

impl SubmissionForm {
    pub fn new(default_currency: impl Into<String>) -> Self {
        let default_currency = default_currency.into();
        Self {
            name: String::new(),
            entry_type: EntryType::Product,
            category: String::new(),
            price: String::new(),
            currency: default_currency.clone(),
            vendor: String::new(),
            country: String::new(),
            city: String::new(),
            link: String::new(),
            errors: FieldErrors::new(),
            error: None,
            default_currency,
            location: None,
            known_currencies: Vec::new(),
        }
    }

    /// Restricts the currency field to the codes the server offers.
    pub fn with_known_currencies<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_currencies = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Updates one field and clears the error shown for it.
    pub fn set_field(&mut self, field: FormField, value: &str) {
        match field {
            FormField::Name => self.name = value.to_string(),
            FormField::Type => match value.parse() {
                Ok(entry_type) => self.entry_type = entry_type,
                Err(reason) => {
                    self.errors.insert(field, reason);
                    return;
                }
            },
            FormField::Category => self.category = value.to_string(),
            FormField::Price => self.price = value.to_string(),
            FormField::Currency => self.currency = value.trim().to_ascii_uppercase(),
            FormField::Vendor => self.vendor = value.to_string(),
            FormField::Country => self.country = value.to_string(),
            FormField::City => self.city = value.to_string(),
            FormField::Link => self.link = value.to_string(),
        }
        self.errors.remove(&field);
    }

    /// Fills country, city and currency from the user's location where still blank.
    pub fn apply_location(&mut self, location: &Location, selected_currency: &str) {
        if self.country.trim().is_empty() {
            self.country = location.country.clone();
        }
        if self.city.trim().is_empty() {
            self.city = location.city.clone();
        }
        if self.currency.trim().is_empty() {
            self.currency = location
                .suggested_currency
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| selected_currency.to_string());
        }
        self.location = Some(location.clone());
    }

    fn currency_is_known(&self, code: &str) -> bool {
        if self.known_currencies.is_empty() {
            is_currency_code(code)
        } else {
            self.known_currencies.iter().any(|known| known == code)
        }
    }

    /// Checks every field and builds the create payload, or returns all field errors.
    pub fn to_new_entry(&self) -> std::result::Result<NewEntry, FieldErrors> {
        let mut errors = FieldErrors::new();

        let required = [
            (FormField::Name, &self.name, "Name is required"),
            (FormField::Category, &self.category, "Category is required"),
            (FormField::Vendor, &self.vendor, "Vendor is required"),
            (FormField::Country, &self.country, "Country is required"),
            (FormField::City, &self.city, "City is required"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                errors.insert(field, message.to_string());
            }
        }

        let price = parse_positive_price(&self.price);
        if price.is_none() {
            errors.insert(FormField::Price, "Valid price is required".to_string());
        }

        let currency = self.currency.trim();
        if !self.currency_is_known(currency) {
            errors.insert(FormField::Currency, "Valid currency is required".to_string());
        }

        let link = self.link.trim();
        if !link.is_empty() && !is_valid_url(link) {
            errors.insert(FormField::Link, "Please enter a valid URL".to_string());
        }

        match price {
            Some(price) if errors.is_empty() => Ok(NewEntry {
                name: self.name.trim().to_string(),
                entry_type: self.entry_type,
                category: self.category.trim().to_string(),
                price,
                currency: currency.to_string(),
                vendor: self.vendor.trim().to_string(),
                country: self.country.trim().to_string(),
                city: self.city.trim().to_string(),
                link: (!link.is_empty()).then(|| link.to_string()),
            }),
            _ => Err(errors),
        }
    }

    /// Runs validation and keeps the errors for display. True when the form can be sent.
    pub fn validate(&mut self) -> bool {
        match self.to_new_entry() {
            Ok(_) => {
                self.errors.clear();
                true
            }
            Err(errors) => {
                self.errors = errors;
                false
            }
        }
    }

    /// Back to an empty form, keeping the location prefill.
    pub fn reset(&mut self) {
        let mut fresh = Self::new(self.default_currency.clone());
        fresh.known_currencies = std::mem::take(&mut self.known_currencies);
        if let Some(location) = self.location.take() {
            fresh.apply_location(&location, &self.default_currency);
            // 重置時幣別沿用目前選擇的幣別
            fresh.currency = self.default_currency.clone();
        }
        *self = fresh;
    }

    pub async fn submit<A: PriceApi + ?Sized>(&mut self, api: &A) -> SubmitOutcome {
        let entry = match self.to_new_entry() {
            Ok(entry) => entry,
            Err(errors) => {
                tracing::debug!("📝 Submission blocked by {} field error(s)", errors.len());
                self.errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
        };

        self.errors.clear();
        self.error = None;
        tracing::info!("📝 Submitting '{}' from {}", entry.name, entry.vendor);

        match api.create_entry(&entry).await {
            Ok(created) => {
                tracing::info!("✅ Entry {} submitted for review", created.id);
                self.reset();
                SubmitOutcome::Submitted {
                    entry: created,
                    redirect_after: REDIRECT_DELAY,
                }
            }
            Err(e) => {
                tracing::error!("❌ Error submitting entry: {}", e);
                let message = match e {
                    PriceBoardError::ApiStatus {
                        server_message: Some(message),
                        ..
                    } => message,
                    _ => GENERIC_SUBMIT_ERROR.to_string(),
                };
                self.error = Some(message.clone());
                SubmitOutcome::Failed { message }
            }
        }
    }
}
