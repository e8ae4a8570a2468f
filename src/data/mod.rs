//! Resale data layer
//!
//! This module provides:
//! - CSV loading and column normalization
//! - Row predicates
//! - The in-memory table with aggregates, trends and text search

pub mod filter;
pub mod loader;
pub mod record;
pub mod table;

pub use filter::{CmpOp, Field, Operand, Predicate, RecordFilter};
pub use loader::{LoadReport, load_dir, load_reader};
pub use record::{COLUMNS, RawRecord, ResaleRecord};
pub use table::{Aggregate, DataSummary, NumericColumn, PriceTrend, ResaleTable, SearchResult, TrendPoint, YearPoint};
