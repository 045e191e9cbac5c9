use chrono::{DateTime, Utc};

const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("CAD", "C$"),
    ("AUD", "A$"),
    ("INR", "₹"),
    ("BRL", "R$"),
    ("KRW", "₩"),
    ("CNY", "¥"),
    ("MXN", "$"),
    ("CHF", "CHF"),
    ("SEK", "kr"),
    ("NOK", "kr"),
    ("DKK", "kr"),
];

const FLAG_COUNTRIES: &[&str] = &[
    "US", "CA", "GB", "DE", "FR", "IT", "ES", "NL", "JP", "AU", "NZ", "CH", "SE", "NO", "DK",
    "CN", "IN", "BR", "MX", "AR", "KR", "SG", "ZA", "RU", "TR", "PL", "CZ", "HU", "TH", "MY",
    "ID", "PH", "VN", "EG", "NG", "KE", "GH", "IL", "AE", "SA",
];

const CATEGORY_ICONS: &[(&str, &str)] = &[
    ("Electronics", "📱"),
    ("Computers", "💻"),
    ("Phones", "📱"),
    ("Laptops", "💻"),
    ("Groceries", "🛒"),
    ("Food", "🍕"),
    ("Haircuts", "✂️"),
    ("Cleaning", "🧽"),
    ("Delivery", "🚚"),
    ("Freelancers", "💼"),
    ("Tutoring", "📚"),
    ("Medical", "🏥"),
    ("Legal Services", "⚖️"),
    ("Transportation", "🚗"),
    ("Accommodation", "🏠"),
    ("Entertainment", "🎬"),
];

const DEFAULT_FLAG: &str = "🌍";
const DEFAULT_CATEGORY_ICON: &str = "📦";

/// Display symbol for a currency code; unknown codes are shown as-is.
pub fn currency_symbol(currency: &str) -> &str {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(code, _)| *code == currency)
        .map(|(_, symbol)| *symbol)
        .unwrap_or(currency)
}

/// 價格格式: 貨幣符號 + 千分位 + 兩位小數
pub fn format_price(price: f64, currency: &str) -> String {
    format!("{}{}", currency_symbol(currency), group_thousands(price))
}

fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // -0.00 不顯示負號
    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

pub fn country_flag(country_code: &str) -> String {
    if !FLAG_COUNTRIES.contains(&country_code) {
        return DEFAULT_FLAG.to_string();
    }
    country_code
        .chars()
        .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

pub fn category_icon(category: &str) -> &'static str {
    CATEGORY_ICONS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_CATEGORY_ICON)
}

fn plural(count: i64, unit: &str) -> String {
    format!("{} {}{} ago", count, unit, if count > 1 { "s" } else { "" })
}

/// Coarse relative time. Months are 30 days and years are 12 of those months.
pub fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }

    let days = hours / 24;
    if days < 30 {
        return plural(days, "day");
    }

    let months = days / 30;
    if months < 12 {
        return plural(months, "month");
    }

    plural(months / 12, "year")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_price_known_symbols() {
        assert_eq!(format_price(12.5, "USD"), "$12.50");
        assert_eq!(format_price(1234567.891, "EUR"), "€1,234,567.89");
        assert_eq!(format_price(999.999, "GBP"), "£1,000.00");
        assert_eq!(format_price(0.0, "JPY"), "¥0.00");
        assert_eq!(format_price(45.0, "SEK"), "kr45.00");
    }

    #[test]
    fn test_format_price_unknown_currency_uses_code() {
        assert_eq!(format_price(10.0, "THB"), "THB10.00");
    }

    #[test]
    fn test_group_thousands_edges() {
        assert_eq!(group_thousands(100.0), "100.00");
        assert_eq!(group_thousands(1000.0), "1,000.00");
        assert_eq!(group_thousands(-2500.5), "-2,500.50");
        assert_eq!(group_thousands(-0.001), "0.00");
    }

    #[test]
    fn test_country_flag() {
        assert_eq!(country_flag("US"), "🇺🇸");
        assert_eq!(country_flag("JP"), "🇯🇵");
        assert_eq!(country_flag("SA"), "🇸🇦");
        assert_eq!(country_flag("XX"), "🌍");
        assert_eq!(country_flag("United States"), "🌍");
    }

    #[test]
    fn test_category_icon() {
        assert_eq!(category_icon("Groceries"), "🛒");
        assert_eq!(category_icon("Legal Services"), "⚖️");
        assert_eq!(category_icon("Gardening"), "📦");
    }

    #[test]
    fn test_format_time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(format_time_ago(now - Duration::seconds(30), now), "just now");
        assert_eq!(format_time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_time_ago(now - Duration::minutes(59), now), "59 minutes ago");
        assert_eq!(format_time_ago(now - Duration::hours(2), now), "2 hours ago");
        assert_eq!(format_time_ago(now - Duration::days(1), now), "1 day ago");
        assert_eq!(format_time_ago(now - Duration::days(29), now), "29 days ago");
        assert_eq!(format_time_ago(now - Duration::days(30), now), "1 month ago");
        assert_eq!(format_time_ago(now - Duration::days(359), now), "11 months ago");
        assert_eq!(format_time_ago(now - Duration::days(360), now), "1 year ago");
        assert_eq!(format_time_ago(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn test_format_time_ago_future_is_just_now() {
        let now = Utc::now();
        assert_eq!(format_time_ago(now + Duration::hours(3), now), "just now");
    }
}
