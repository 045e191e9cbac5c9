use crate::core::moderation::ModerationStats;
use crate::core::submission::FieldErrors;
use crate::domain::model::{Country, Currency, Listing, Location};
use crate::utils::error::Result;
use crate::utils::format::{category_icon, country_flag, format_price, format_time_ago};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Flag for a listing's country name, looked up in the loaded country list.
pub fn flag_for_country(country: &str, countries: &[Country]) -> String {
    let code = countries
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(country) || c.code.eq_ignore_ascii_case(country))
        .map(|c| c.code.to_ascii_uppercase())
        .unwrap_or_default();
    country_flag(&code)
}

/// One listing as a short text card.
pub fn listing_card(listing: &Listing, countries: &[Country], now: DateTime<Utc>) -> String {
    let (price, currency) = listing.display_price();
    let mut card = format!(
        "{} {} [{}]  {}\n   {} · {}\n   {} {}, {} · {}",
        category_icon(&listing.category),
        listing.name,
        listing.entry_type,
        format_price(price, currency),
        listing.category,
        listing.vendor,
        flag_for_country(&listing.country, countries),
        listing.city,
        listing.country,
        format_time_ago(listing.created_at, now),
    );

    if listing.was_converted() {
        card.push_str(&format!(
            "\n   (converted from {})",
            format_price(listing.price, &listing.currency)
        ));
    }
    if let Some(link) = listing.link() {
        card.push_str(&format!("\n   🔗 {}", link));
    }
    card.push_str(&format!("\n   id: {}", listing.id));
    card
}

pub fn write_cards<W: Write>(
    out: &mut W,
    listings: &[Listing],
    countries: &[Country],
    now: DateTime<Utc>,
) -> Result<()> {
    for listing in listings {
        writeln!(out, "{}\n", listing_card(listing, countries, now))?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ListingRow<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    entry_type: &'a str,
    category: &'a str,
    price: f64,
    currency: &'a str,
    display_price: f64,
    display_currency: &'a str,
    vendor: &'a str,
    country: &'a str,
    city: &'a str,
    link: &'a str,
    created_at: String,
}

impl<'a> From<&'a Listing> for ListingRow<'a> {
    fn from(listing: &'a Listing) -> Self {
        let (display_price, display_currency) = listing.display_price();
        Self {
            id: listing.id.as_str(),
            name: &listing.name,
            entry_type: listing.entry_type.as_str(),
            category: &listing.category,
            price: listing.price,
            currency: &listing.currency,
            display_price,
            display_currency,
            vendor: &listing.vendor,
            country: &listing.country,
            city: &listing.city,
            link: listing.link().unwrap_or_default(),
            created_at: listing.created_at.to_rfc3339(),
        }
    }
}

/// Flat CSV with a header row. Original and displayed prices both appear.
pub fn write_csv<W: Write>(out: W, listings: &[Listing]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for listing in listings {
        writer.serialize(ListingRow::from(listing))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write, T: Serialize + ?Sized>(mut out: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// "Showing N items (filters: ...)" summary line under the feed.
pub fn feed_summary(count: usize, has_more: bool, filter_labels: &[String]) -> String {
    let mut summary = format!("Showing {} item{}", count, if count == 1 { "" } else { "s" });
    if !filter_labels.is_empty() {
        summary.push_str(&format!(" (filters: {})", filter_labels.join(", ")));
    }
    if has_more {
        summary.push_str(" · more available");
    }
    summary
}

pub fn field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  {}: {}", field, message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn currency_line(currency: &Currency, selected: &str) -> String {
    let marker = if currency.code == selected { "*" } else { " " };
    format!("{} {} {:<4} {}", marker, currency.code, currency.symbol, currency.name)
}

pub fn location_line(location: &Location) -> String {
    format!(
        "{} {}, {} ({})",
        country_flag(&location.country_code),
        location.city,
        location.country,
        location.suggested_currency.as_deref().unwrap_or("no suggested currency"),
    )
}

pub fn stats_line(stats: &ModerationStats) -> String {
    format!(
        "Pending: {} · Approved: {} · Rejected: {}",
        stats.pending, stats.approved, stats.rejected
    )
}
