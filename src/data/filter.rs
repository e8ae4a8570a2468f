//! Row predicates over resale records.
//!
//! A [`RecordFilter`] is a conjunction of [`Predicate`]s. The intent
//! handlers build simple equality filters; the query-tag language builds
//! arbitrary comparisons.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use super::record::{ResaleRecord, normalize_flat_type, parse_month};
use crate::error::{AdvisorError, Result};

/// A filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Town,
    FlatType,
    FlatModel,
    StoreyRange,
    StreetName,
    Block,
    Year,
    Month,
    FloorAreaSqm,
    ResalePrice,
    LeaseCommenceDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
    Month,
}

impl Field {
    /// Look up a field by its column name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "town" => Some(Field::Town),
            "flat_type" => Some(Field::FlatType),
            "flat_model" => Some(Field::FlatModel),
            "storey_range" => Some(Field::StoreyRange),
            "street_name" | "street" => Some(Field::StreetName),
            "block" => Some(Field::Block),
            "year" => Some(Field::Year),
            "month" => Some(Field::Month),
            "floor_area_sqm" => Some(Field::FloorAreaSqm),
            "resale_price" | "price" => Some(Field::ResalePrice),
            "lease_commence_date" => Some(Field::LeaseCommenceDate),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Town => "town",
            Field::FlatType => "flat_type",
            Field::FlatModel => "flat_model",
            Field::StoreyRange => "storey_range",
            Field::StreetName => "street_name",
            Field::Block => "block",
            Field::Year => "year",
            Field::Month => "month",
            Field::FloorAreaSqm => "floor_area_sqm",
            Field::ResalePrice => "resale_price",
            Field::LeaseCommenceDate => "lease_commence_date",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Field::Town
            | Field::FlatType
            | Field::FlatModel
            | Field::StoreyRange
            | Field::StreetName
            | Field::Block => FieldKind::Text,
            Field::Year | Field::FloorAreaSqm | Field::ResalePrice | Field::LeaseCommenceDate => FieldKind::Number,
            Field::Month => FieldKind::Month,
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CmpOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" | "==" => Some(CmpOp::Eq),
            "!=" | "<>" => Some(CmpOp::Ne),
            ">" => Some(CmpOp::Gt),
            "<" => Some(CmpOp::Lt),
            ">=" => Some(CmpOp::Ge),
            "<=" => Some(CmpOp::Le),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
        }
    }

    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Ge => ordering != Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
        }
    }
}

/// Right-hand side of a predicate, already coerced to the field's type.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Text(String),
    Number(f64),
    Month(NaiveDate),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Text(s) => write!(f, "{}", s),
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Month(m) => write!(f, "{}", m.format("%Y-%m")),
        }
    }
}

/// `field op value`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: Field,
    pub op: CmpOp,
    pub value: Operand,
}

impl Predicate {
    /// Build a predicate, coercing `raw` to the field's type.
    pub fn new(field: Field, op: CmpOp, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let value = match field.kind() {
            FieldKind::Text if field == Field::FlatType => Operand::Text(normalize_flat_type(raw)),
            FieldKind::Text => Operand::Text(raw.to_lowercase()),
            FieldKind::Number => raw
                .parse::<f64>()
                .map(Operand::Number)
                .map_err(|_| AdvisorError::QueryTag(format!("{} expects a number, got '{}'", field.name(), raw)))?,
            FieldKind::Month => parse_month(raw)
                .map(Operand::Month)
                .ok_or_else(|| AdvisorError::QueryTag(format!("month expects YYYY-MM, got '{}'", raw)))?,
        };
        Ok(Self { field, op, value })
    }

    /// Equality predicate on a text field.
    pub fn eq_text(field: Field, value: &str) -> Self {
        let value = if field == Field::FlatType {
            normalize_flat_type(value)
        } else {
            value.trim().to_lowercase()
        };
        Self {
            field,
            op: CmpOp::Eq,
            value: Operand::Text(value),
        }
    }

    pub fn matches(&self, record: &ResaleRecord) -> bool {
        let ordering = match (&self.value, self.field) {
            (Operand::Text(v), Field::Town) => Some(record.town.as_str().cmp(v.as_str())),
            (Operand::Text(v), Field::FlatType) => Some(record.flat_type.as_str().cmp(v.as_str())),
            (Operand::Text(v), Field::FlatModel) => Some(record.flat_model.as_str().cmp(v.as_str())),
            (Operand::Text(v), Field::StoreyRange) => Some(record.storey_range.as_str().cmp(v.as_str())),
            (Operand::Text(v), Field::StreetName) => Some(record.street_name.as_str().cmp(v.as_str())),
            (Operand::Text(v), Field::Block) => Some(record.block.as_str().cmp(v.as_str())),
            (Operand::Number(v), Field::Year) => (record.year() as f64).partial_cmp(v),
            (Operand::Number(v), Field::FloorAreaSqm) => record.floor_area_sqm.partial_cmp(v),
            (Operand::Number(v), Field::ResalePrice) => record.resale_price.partial_cmp(v),
            (Operand::Number(v), Field::LeaseCommenceDate) => {
                record.lease_commence_date.and_then(|y| (y as f64).partial_cmp(v))
            }
            (Operand::Month(v), Field::Month) => Some(record.month.cmp(v)),
            _ => None,
        };
        ordering.is_some_and(|o| self.op.accepts(o))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field.name(), self.op.symbol(), self.value)
    }
}

/// Conjunction of predicates; the empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    predicates: Vec<Predicate>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn town(self, town: &str) -> Self {
        self.with(Predicate::eq_text(Field::Town, town))
    }

    pub fn flat_type(self, flat_type: &str) -> Self {
        self.with(Predicate::eq_text(Field::FlatType, flat_type))
    }

    pub fn year(self, year: i32) -> Self {
        self.with(Predicate {
            field: Field::Year,
            op: CmpOp::Eq,
            value: Operand::Number(year as f64),
        })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &ResaleRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Human-readable description, e.g. `4 room flats in bedok in 2023`.
    pub fn describe(&self) -> String {
        let mut flat_type = None;
        let mut town = None;
        let mut year = None;
        let mut rest = Vec::new();

        for p in &self.predicates {
            match (p.field, p.op, &p.value) {
                (Field::FlatType, CmpOp::Eq, Operand::Text(v)) if flat_type.is_none() => flat_type = Some(v.clone()),
                (Field::Town, CmpOp::Eq, Operand::Text(v)) if town.is_none() => town = Some(v.clone()),
                (Field::Year, CmpOp::Eq, Operand::Number(v)) if year.is_none() => year = Some(*v as i32),
                _ => rest.push(p.to_string()),
            }
        }

        let mut text = match flat_type {
            Some(ft) => format!("{} flats", ft),
            None => "all flats".to_string(),
        };
        if let Some(t) = town {
            text.push_str(&format!(" in {}", t));
        }
        if let Some(y) = year {
            text.push_str(&format!(" in {}", y));
        }
        if !rest.is_empty() {
            text.push_str(&format!(" where {}", rest.join(" and ")));
        }
        text
    }
}
