use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Entry identifier. The API sends it either as a string or as an integer,
/// it is always kept as a string here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// Some rows carry decimals as strings ("12.50").
fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    match RawPrice::deserialize(deserializer)? {
        RawPrice::Number(n) => Ok(n),
        RawPrice::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price '{}'", s))),
    }
}

/// RFC 3339 first, then a zone-less timestamp taken as UTC.
fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Product,
    Service,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Self::Product),
            "service" => Ok(Self::Service),
            other => Err(format!("unknown entry type '{}', expected product or service", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Approved,
    Rejected,
}

/// 一筆價格紀錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: EntryId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub entry_type: EntryType,
    #[serde(default)]
    pub category: String,
    #[serde(deserialize_with = "lenient_price")]
    pub price: f64,
    pub currency: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
}

impl Listing {
    /// Price and currency to show: the converted pair when the server sent one.
    pub fn display_price(&self) -> (f64, &str) {
        match (self.converted_price, self.target_currency.as_deref()) {
            (Some(price), Some(currency)) => (price, currency),
            _ => (self.price, &self.currency),
        }
    }

    pub fn was_converted(&self) -> bool {
        let (_, currency) = self.display_price();
        self.converted_price.is_some() && currency != self.currency
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref().filter(|l| !l.trim().is_empty())
    }
}

/// Create/update payload for an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: String,
    pub price: f64,
    pub currency: String,
    pub vendor: String,
    pub country: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

impl Currency {
    pub fn new(code: &str, name: &str, symbol: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub country_code: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_currency: Option<String>,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            country: "United States".to_string(),
            country_code: "US".to_string(),
            city: "New York".to_string(),
            suggested_currency: Some("USD".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from_currency: String,
    pub to_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub converted_amount: f64,
    #[serde(default)]
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Newest,
    Price,
    Popularity,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Price => "price",
            Self::Popularity => "popularity",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "price" => Ok(Self::Price),
            "popularity" => Ok(Self::Popularity),
            other => Err(format!(
                "unknown sort key '{}', expected newest, price or popularity",
                other
            )),
        }
    }
}

/// Query for one page of `/entries`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingQuery {
    pub limit: usize,
    pub offset: usize,
    pub currency: Option<String>,
    pub search: Option<String>,
    pub entry_type: Option<EntryType>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: Option<SortKey>,
}

impl ListingQuery {
    /// Query-string pairs; unset and blank values are left out.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];

        let text_params = [
            ("currency", &self.currency),
            ("search", &self.search),
            ("category", &self.category),
            ("country", &self.country),
            ("city", &self.city),
        ];
        for (key, value) in text_params {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }

        if let Some(entry_type) = self.entry_type {
            pairs.push(("type", entry_type.as_str().to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }

        pairs
    }
}

/// Every successful response wraps its payload in `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
}

/// Error body the server sends on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_listing(id: &str, name: &str) -> Listing {
    Listing {
        id: EntryId::from(id),
        name: name.to_string(),
        entry_type: EntryType::Product,
        category: "Electronics".to_string(),
        price: 10.0,
        currency: "USD".to_string(),
        vendor: "Corner Shop".to_string(),
        country: "United States".to_string(),
        city: "Boston".to_string(),
        link: None,
        created_at: Utc::now(),
        converted_price: None,
        target_currency: None,
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing_json() -> serde_json::Value {
        json!({
            "id": 42,
            "name": "Pixel 8",
            "type": "product",
            "category": "Phones",
            "price": 699.0,
            "currency": "USD",
            "vendor": "Best Buy",
            "country": "United States",
            "city": "Austin",
            "link": "https://example.com/pixel",
            "created_at": "2024-05-01T12:00:00Z"
        })
    }

    #[test]
    fn test_listing_accepts_numeric_and_string_ids() {
        let listing: Listing = serde_json::from_value(listing_json()).unwrap();
        assert_eq!(listing.id.as_str(), "42");

        let mut raw = listing_json();
        raw["id"] = json!("abc-123");
        let listing: Listing = serde_json::from_value(raw).unwrap();
        assert_eq!(listing.id, EntryId::from("abc-123"));
    }

    #[test]
    fn test_listing_tolerates_missing_display_fields_and_string_price() {
        let mut raw = listing_json();
        let fields = raw.as_object_mut().unwrap();
        fields.remove("vendor");
        fields.remove("city");
        fields.remove("country");
        fields.remove("category");
        raw["price"] = json!("12.50");

        let listing: Listing = serde_json::from_value(raw).unwrap();
        assert_eq!(listing.price, 12.5);
        assert!(listing.vendor.is_empty());
        assert!(listing.city.is_empty());

        let mut raw = listing_json();
        raw["price"] = json!("free");
        assert!(serde_json::from_value::<Listing>(raw).is_err());
    }

    #[test]
    fn test_display_price_prefers_conversion() {
        let mut raw = listing_json();
        raw["converted_price"] = json!(640.5);
        raw["target_currency"] = json!("EUR");
        let listing: Listing = serde_json::from_value(raw).unwrap();

        assert_eq!(listing.display_price(), (640.5, "EUR"));
        assert!(listing.was_converted());
    }

    #[test]
    fn test_display_price_without_target_currency_keeps_original() {
        let mut raw = listing_json();
        raw["converted_price"] = json!(640.5);
        let listing: Listing = serde_json::from_value(raw).unwrap();

        assert_eq!(listing.display_price(), (699.0, "USD"));
        assert!(!listing.was_converted());
    }

    #[test]
    fn test_new_entry_serializes_type_key_and_skips_empty_link() {
        let entry = NewEntry {
            name: "Haircut".to_string(),
            entry_type: EntryType::Service,
            category: "Haircuts".to_string(),
            price: 25.0,
            currency: "EUR".to_string(),
            vendor: "Salon".to_string(),
            country: "Germany".to_string(),
            city: "Berlin".to_string(),
            link: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "service");
        assert!(value.get("link").is_none());
        assert!(value.get("entry_type").is_none());
    }

    #[test]
    fn test_zone_less_timestamp_is_utc() {
        let mut raw = listing_json();
        raw["created_at"] = json!("2024-05-01T12:00:00.123");
        let listing: Listing = serde_json::from_value(raw).unwrap();
        assert_eq!(listing.created_at.to_rfc3339(), "2024-05-01T12:00:00.123+00:00");
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: ApiEnvelope<Vec<Listing>> = serde_json::from_value(json!({})).unwrap();
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_query_pairs_skip_blank_values() {
        let query = ListingQuery {
            limit: 20,
            offset: 40,
            currency: Some("EUR".to_string()),
            search: Some("  ".to_string()),
            entry_type: Some(EntryType::Service),
            city: Some(" Berlin ".to_string()),
            sort: Some(SortKey::Price),
            ..Default::default()
        };

        let pairs = query.to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("limit", "20".to_string()),
                ("offset", "40".to_string()),
                ("currency", "EUR".to_string()),
                ("city", "Berlin".to_string()),
                ("type", "service".to_string()),
                ("sort", "price".to_string()),
            ]
        );
    }

    #[test]
    fn test_entry_type_from_str() {
        assert_eq!("Service".parse::<EntryType>(), Ok(EntryType::Service));
        assert!("thing".parse::<EntryType>().is_err());
    }
}
