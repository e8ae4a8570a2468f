//! In-memory resale table and the aggregates the query handlers need.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::filter::RecordFilter;
use super::record::{COLUMNS, ResaleRecord};

/// Aggregate function over a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Median,
    Min,
    Max,
    Count,
    Sum,
}

impl Aggregate {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "mean" | "avg" | "average" => Some(Aggregate::Mean),
            "median" => Some(Aggregate::Median),
            "min" | "minimum" => Some(Aggregate::Min),
            "max" | "maximum" => Some(Aggregate::Max),
            "count" => Some(Aggregate::Count),
            "sum" | "total" => Some(Aggregate::Sum),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Aggregate::Mean => "mean",
            Aggregate::Median => "median",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
        }
    }
}

/// Numeric column an aggregate can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    ResalePrice,
    FloorAreaSqm,
    LeaseCommenceDate,
    PricePerSqm,
}

impl NumericColumn {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "resale_price" | "price" => Some(NumericColumn::ResalePrice),
            "floor_area_sqm" | "floor_area" => Some(NumericColumn::FloorAreaSqm),
            "lease_commence_date" => Some(NumericColumn::LeaseCommenceDate),
            "price_per_sqm" => Some(NumericColumn::PricePerSqm),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::ResalePrice => "resale_price",
            NumericColumn::FloorAreaSqm => "floor_area_sqm",
            NumericColumn::LeaseCommenceDate => "lease_commence_date",
            NumericColumn::PricePerSqm => "price_per_sqm",
        }
    }

    pub fn value(self, record: &ResaleRecord) -> Option<f64> {
        match self {
            NumericColumn::ResalePrice => Some(record.resale_price),
            NumericColumn::FloorAreaSqm => Some(record.floor_area_sqm),
            NumericColumn::LeaseCommenceDate => record.lease_commence_date.map(f64::from),
            NumericColumn::PricePerSqm => record.price_per_sqm(),
        }
    }
}

/// Mean price for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub month: NaiveDate,
    pub mean_price: f64,
    pub transactions: usize,
}

/// Mean price for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: i32,
    pub mean_price: f64,
    pub transactions: usize,
}

/// Monthly mean resale price, ascending by month.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceTrend {
    pub points: Vec<TrendPoint>,
}

impl PriceTrend {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Collapse monthly points into transaction-weighted yearly means.
    pub fn by_year(&self) -> Vec<YearPoint> {
        let mut years: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
        for p in &self.points {
            let entry = years.entry(chrono::Datelike::year(&p.month)).or_default();
            entry.0 += p.mean_price * p.transactions as f64;
            entry.1 += p.transactions;
        }
        years
            .into_iter()
            .map(|(year, (total, transactions))| YearPoint {
                year,
                mean_price: total / transactions as f64,
                transactions,
            })
            .collect()
    }

    /// Relative change between the first and last month, in percent.
    pub fn change_percent(&self) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        (first.mean_price > 0.0).then(|| (last.mean_price - first.mean_price) / first.mean_price * 100.0)
    }
}

/// Rows matched by a text search.
#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    pub rows: Vec<&'a ResaleRecord>,
    /// Total number of matching rows, before the display limit
    pub total: usize,
}

/// Overview of the loaded table, embedded into LLM prompts.
#[derive(Debug, Clone, Serialize)]
pub struct DataSummary {
    pub rows: usize,
    pub first_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
    pub towns: Vec<String>,
    pub flat_types: Vec<String>,
    pub mean_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub columns: Vec<&'static str>,
}

impl fmt::Display for DataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.rows)?;
        if let (Some(first), Some(last)) = (self.first_month, self.last_month) {
            writeln!(f, "Months covered: {} to {}", first.format("%Y-%m"), last.format("%Y-%m"))?;
        }
        writeln!(f, "Columns: {}", self.columns.join(", "))?;
        writeln!(f, "Towns: {}", self.towns.join(", "))?;
        writeln!(f, "Flat types: {}", self.flat_types.join(", "))?;
        if let (Some(mean), Some(median), Some(min), Some(max)) =
            (self.mean_price, self.median_price, self.min_price, self.max_price)
        {
            writeln!(
                f,
                "Resale price: mean {:.0}, median {:.0}, min {:.0}, max {:.0}",
                mean, median, min, max
            )?;
        }
        Ok(())
    }
}

/// All loaded resale transactions.
#[derive(Debug, Clone, Default)]
pub struct ResaleTable {
    records: Vec<ResaleRecord>,
}

impl ResaleTable {
    pub fn new(records: Vec<ResaleRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ResaleRecord] {
        &self.records
    }

    pub fn filter(&self, filter: &RecordFilter) -> Vec<&ResaleRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Run `aggregate` over `column` for the rows matching `filter`.
    ///
    /// Returns `None` when nothing matches, except for `Count` which is
    /// always defined.
    pub fn aggregate(&self, aggregate: Aggregate, column: NumericColumn, filter: &RecordFilter) -> Option<f64> {
        let mut values: Vec<f64> = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .filter_map(|r| column.value(r))
            .collect();

        match aggregate {
            Aggregate::Count => Some(values.len() as f64),
            _ if values.is_empty() => None,
            Aggregate::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Aggregate::Sum => Some(values.iter().sum()),
            Aggregate::Min => values.iter().copied().reduce(f64::min),
            Aggregate::Max => values.iter().copied().reduce(f64::max),
            Aggregate::Median => {
                values.sort_by(f64::total_cmp);
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    Some((values[mid - 1] + values[mid]) / 2.0)
                } else {
                    Some(values[mid])
                }
            }
        }
    }

    pub fn mean_price(&self, filter: &RecordFilter) -> Option<f64> {
        self.aggregate(Aggregate::Mean, NumericColumn::ResalePrice, filter)
    }

    pub fn median_price(&self, filter: &RecordFilter) -> Option<f64> {
        self.aggregate(Aggregate::Median, NumericColumn::ResalePrice, filter)
    }

    pub fn count(&self, filter: &RecordFilter) -> usize {
        self.records.iter().filter(|r| filter.matches(r)).count()
    }

    /// Monthly mean resale price for the matching rows.
    pub fn price_trend(&self, filter: &RecordFilter) -> PriceTrend {
        let mut months: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for r in self.records.iter().filter(|r| filter.matches(r)) {
            let entry = months.entry(r.month).or_default();
            entry.0 += r.resale_price;
            entry.1 += 1;
        }
        PriceTrend {
            points: months
                .into_iter()
                .map(|(month, (total, transactions))| TrendPoint {
                    month,
                    mean_price: total / transactions as f64,
                    transactions,
                })
                .collect(),
        }
    }

    /// Rows where any column contains `text`, case-insensitively.
    pub fn search(&self, text: &str, limit: usize) -> SearchResult<'_> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return SearchResult {
                rows: Vec::new(),
                total: 0,
            };
        }
        let matches: Vec<&ResaleRecord> = self
            .records
            .iter()
            .filter(|r| r.field_strings().iter().any(|f| f.contains(&needle)))
            .collect();
        let total = matches.len();
        SearchResult {
            rows: matches.into_iter().take(limit).collect(),
            total,
        }
    }

    /// Distinct towns, sorted.
    pub fn towns(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.town.as_str()))
    }

    /// Distinct flat types, sorted.
    pub fn flat_types(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.flat_type.as_str()))
    }

    pub fn summary(&self) -> DataSummary {
        let all = RecordFilter::new();
        DataSummary {
            rows: self.records.len(),
            first_month: self.records.iter().map(|r| r.month).min(),
            last_month: self.records.iter().map(|r| r.month).max(),
            towns: self.towns(),
            flat_types: self.flat_types(),
            mean_price: self.mean_price(&all),
            median_price: self.median_price(&all),
            min_price: self.aggregate(Aggregate::Min, NumericColumn::ResalePrice, &all),
            max_price: self.aggregate(Aggregate::Max, NumericColumn::ResalePrice, &all),
            columns: COLUMNS.to_vec(),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
