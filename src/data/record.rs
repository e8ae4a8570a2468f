//! Resale transaction records and column normalization.
//!
//! CSV rows are first read into [`RawRecord`] with every field as an optional
//! string, then coerced into a typed [`ResaleRecord`]. Rows that cannot be
//! coerced are dropped by the loader.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

static REMAINING_LEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*years?(?:\s+(\d+)\s*months?)?$").expect("remaining lease pattern is valid")
});

/// Column names of the government resale dataset, in file order.
pub const COLUMNS: [&str; 11] = [
    "month",
    "town",
    "flat_type",
    "block",
    "street_name",
    "storey_range",
    "floor_area_sqm",
    "flat_model",
    "lease_commence_date",
    "remaining_lease",
    "resale_price",
];

/// A CSV row before type coercion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub month: Option<String>,
    pub town: Option<String>,
    pub flat_type: Option<String>,
    pub block: Option<String>,
    pub street_name: Option<String>,
    pub storey_range: Option<String>,
    pub floor_area_sqm: Option<String>,
    pub flat_model: Option<String>,
    pub lease_commence_date: Option<String>,
    pub remaining_lease: Option<String>,
    pub resale_price: Option<String>,
}

/// One resale transaction with normalized column types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResaleRecord {
    /// First day of the transaction month
    pub month: NaiveDate,
    pub town: String,
    pub flat_type: String,
    pub block: String,
    pub street_name: String,
    pub storey_range: String,
    pub floor_area_sqm: f64,
    pub flat_model: String,
    /// Year the lease started
    pub lease_commence_date: Option<u32>,
    /// Remaining lease in months
    pub remaining_lease_months: Option<u32>,
    pub resale_price: f64,
}

impl ResaleRecord {
    /// Coerce a raw row. Returns `None` when month, floor area or price
    /// cannot be parsed.
    pub fn from_raw(raw: RawRecord) -> Option<Self> {
        let month = parse_month(raw.month.as_deref()?)?;
        let floor_area_sqm = parse_number(raw.floor_area_sqm.as_deref()?)?;
        let resale_price = parse_number(raw.resale_price.as_deref()?)?;

        Some(Self {
            month,
            town: normalize_text(raw.town.as_deref()),
            flat_type: normalize_flat_type(raw.flat_type.as_deref().unwrap_or_default()),
            block: normalize_text(raw.block.as_deref()),
            street_name: normalize_text(raw.street_name.as_deref()),
            storey_range: normalize_text(raw.storey_range.as_deref()),
            floor_area_sqm,
            flat_model: normalize_text(raw.flat_model.as_deref()),
            lease_commence_date: raw
                .lease_commence_date
                .as_deref()
                .and_then(parse_number)
                .filter(|y| LEASE_YEARS.contains(y))
                .map(|y| y as u32),
            remaining_lease_months: raw.remaining_lease.as_deref().and_then(parse_remaining_lease),
            resale_price,
        })
    }

    /// Calendar year of the transaction.
    pub fn year(&self) -> i32 {
        self.month.year()
    }

    /// Price divided by floor area.
    pub fn price_per_sqm(&self) -> Option<f64> {
        (self.floor_area_sqm > 0.0).then(|| self.resale_price / self.floor_area_sqm)
    }

    /// String form of every column, in [`COLUMNS`] order.
    pub fn field_strings(&self) -> Vec<String> {
        vec![
            self.month.format("%Y-%m").to_string(),
            self.town.clone(),
            self.flat_type.clone(),
            self.block.clone(),
            self.street_name.clone(),
            self.storey_range.clone(),
            format_decimal(self.floor_area_sqm),
            self.flat_model.clone(),
            self.lease_commence_date.map(|y| y.to_string()).unwrap_or_default(),
            self.remaining_lease_months
                .map(format_remaining_lease)
                .unwrap_or_default(),
            format_decimal(self.resale_price),
        ]
    }
}

/// Years a lease can plausibly have started in.
const LEASE_YEARS: std::ops::RangeInclusive<f64> = 1900.0..=2100.0;

/// Lowercase and trim a text column.
pub fn normalize_text(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_lowercase()
}

/// Lowercase a flat type and fold `-` into spaces so `4-ROOM`, `4 ROOM` and
/// `MULTI-GENERATION` compare equal to what users type.
pub fn normalize_flat_type(value: &str) -> String {
    value
        .to_lowercase()
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `YYYY-MM` (or a full `YYYY-MM-DD`) into the first day of the month.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
        .and_then(|d| d.with_day(1))
}

fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse `"61 years 04 months"`, `"61 years"` or a bare year count into months.
pub fn parse_remaining_lease(value: &str) -> Option<u32> {
    let value = value.trim().to_lowercase();
    if let Ok(years) = value.parse::<u32>() {
        return years.checked_mul(12);
    }
    let caps = REMAINING_LEASE.captures(&value)?;
    let years: u32 = caps.get(1)?.as_str().parse().ok()?;
    let months: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    years.checked_mul(12)?.checked_add(months)
}

fn format_remaining_lease(months: u32) -> String {
    format!("{} years {:02} months", months / 12, months % 12)
}

fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}
