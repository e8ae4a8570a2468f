//! Embedded data queries in LLM replies.
//!
//! The model is asked to write figures it cannot know as tags such as
//! `[QUERY]mean resale_price where town = bedok and year = 2023[/QUERY]`
//! (or the short form `[QQ]...[/QQ]`). Each tag body is parsed into a
//! [`DataQuery`], evaluated against the table, and replaced by the
//! formatted result.
//!
//! ## Grammar
//!
//! ```text
//! query := agg [of] [column] [where cond (and cond)*]
//! agg   := mean | avg | average | median | min | max | count | sum
//! cond  := field op value
//! op    := = | == | != | <> | > | < | >= | <=
//! value := quoted string | words up to the next `and`
//! ```
//!
//! Tag bodies are data, never code: anything outside the grammar is
//! rejected and the tag is replaced with [`UNAVAILABLE`].

use std::ops::Range;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::data::{Aggregate, CmpOp, Field, NumericColumn, Predicate, RecordFilter, ResaleTable};
use crate::error::{AdvisorError, Result};
use crate::format;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\[QUERY\](.*?)\[/QUERY\]|\[QQ\](.*?)\[/QQ\]").expect("tag pattern is valid")
});

/// Replacement text for a tag that could not be answered.
pub const UNAVAILABLE: &str = "N/A";

/// One tag found in a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct TagMatch {
    /// Byte range of the whole tag, delimiters included
    pub range: Range<usize>,
    /// Text between the delimiters, trimmed
    pub body: String,
}

/// Find every tag in `text`, in order.
pub fn extract(text: &str) -> Vec<TagMatch> {
    TAG.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1).or_else(|| caps.get(2))?;
            Some(TagMatch {
                range: whole.range(),
                body: body.as_str().trim().trim_matches('`').trim().to_string(),
            })
        })
        .collect()
}

/// A parsed tag body.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    pub aggregate: Aggregate,
    pub column: NumericColumn,
    pub filter: RecordFilter,
}

impl DataQuery {
    pub fn evaluate(&self, table: &ResaleTable) -> Option<f64> {
        table.aggregate(self.aggregate, self.column, &self.filter)
    }

    /// Format a result the way it should read inside prose.
    pub fn format_value(&self, value: f64) -> String {
        if self.aggregate == Aggregate::Count {
            return format::thousands(value.round() as u64);
        }
        match self.column {
            NumericColumn::ResalePrice | NumericColumn::PricePerSqm => format::currency(value),
            NumericColumn::FloorAreaSqm => format!("{:.1} sqm", value),
            NumericColumn::LeaseCommenceDate => format!("{:.0}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Op(CmpOp),
}

fn tokenize(body: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            chars.next();
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some(ch) if ch == c => break,
                    Some(ch) => value.push(ch),
                    None => return Err(AdvisorError::QueryTag("unterminated string".to_string())),
                }
            }
            tokens.push(Token::Quoted(value));
        } else if matches!(c, '=' | '!' | '<' | '>') {
            let mut symbol = String::new();
            while let Some(&ch) = chars.peek() {
                if matches!(ch, '=' | '!' | '<' | '>') {
                    symbol.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            let op = CmpOp::from_symbol(&symbol)
                .ok_or_else(|| AdvisorError::QueryTag(format!("unknown operator '{}'", symbol)))?;
            tokens.push(Token::Op(op));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || matches!(ch, '=' | '!' | '<' | '>' | '"' | '\'' | ',') {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}

fn is_keyword(token: Option<&Token>, keyword: &str) -> bool {
    matches!(token, Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
}

/// Parse a tag body.
pub fn parse(body: &str) -> Result<DataQuery> {
    let tokens = tokenize(body)?;
    let mut pos = 0;

    let aggregate = match tokens.first() {
        Some(Token::Word(w)) => {
            Aggregate::from_name(w).ok_or_else(|| AdvisorError::QueryTag(format!("unknown aggregate '{}'", w)))?
        }
        _ => return Err(AdvisorError::QueryTag("query must start with an aggregate".to_string())),
    };
    pos += 1;

    if is_keyword(tokens.get(pos), "of") {
        pos += 1;
    }

    let column = match tokens.get(pos) {
        Some(Token::Word(w)) if !w.eq_ignore_ascii_case("where") => {
            pos += 1;
            NumericColumn::from_name(w).ok_or_else(|| AdvisorError::QueryTag(format!("unknown column '{}'", w)))?
        }
        _ if aggregate == Aggregate::Count => NumericColumn::ResalePrice,
        _ => return Err(AdvisorError::QueryTag("missing column".to_string())),
    };

    let mut filter = RecordFilter::new();

    if pos < tokens.len() {
        if !is_keyword(tokens.get(pos), "where") {
            return Err(AdvisorError::QueryTag("expected 'where'".to_string()));
        }
        pos += 1;

        loop {
            let field = match tokens.get(pos) {
                Some(Token::Word(w)) => {
                    Field::from_name(w).ok_or_else(|| AdvisorError::QueryTag(format!("unknown field '{}'", w)))?
                }
                _ => return Err(AdvisorError::QueryTag("expected a field name".to_string())),
            };
            pos += 1;

            let op = match tokens.get(pos) {
                Some(Token::Op(op)) => *op,
                _ => return Err(AdvisorError::QueryTag(format!("expected an operator after {}", field.name()))),
            };
            pos += 1;

            let value = match tokens.get(pos) {
                Some(Token::Quoted(v)) => {
                    pos += 1;
                    v.clone()
                }
                Some(Token::Word(_)) => {
                    let mut words = Vec::new();
                    while let Some(Token::Word(w)) = tokens.get(pos) {
                        if w.eq_ignore_ascii_case("and") {
                            break;
                        }
                        words.push(w.as_str());
                        pos += 1;
                    }
                    words.join(" ")
                }
                _ => return Err(AdvisorError::QueryTag(format!("missing value for {}", field.name()))),
            };

            filter = filter.with(Predicate::new(field, op, &value)?);

            match tokens.get(pos) {
                None => break,
                t if is_keyword(t, "and") => pos += 1,
                _ => return Err(AdvisorError::QueryTag("expected 'and' between conditions".to_string())),
            }
        }
    }

    Ok(DataQuery {
        aggregate,
        column,
        filter,
    })
}

/// What happened to one tag during splicing.
#[derive(Debug, Clone, PartialEq)]
pub struct TagOutcome {
    pub body: String,
    /// Formatted value, or the reason it is unavailable
    pub result: std::result::Result<String, String>,
}

/// Reply text with every tag replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceOutcome {
    pub text: String,
    pub tags: Vec<TagOutcome>,
}

impl SpliceOutcome {
    pub fn failed(&self) -> usize {
        self.tags.iter().filter(|t| t.result.is_err()).count()
    }
}

/// Evaluate a single tag body to its display text.
pub fn evaluate_body(body: &str, table: &ResaleTable) -> std::result::Result<String, String> {
    let query = parse(body).map_err(|e| e.to_string())?;
    query
        .evaluate(table)
        .map(|v| query.format_value(v))
        .ok_or_else(|| format!("no rows match {}", query.filter.describe()))
}

/// Replace every tag in `text` with its evaluated value.
pub fn splice(text: &str, table: &ResaleTable) -> SpliceOutcome {
    let mut out = String::with_capacity(text.len());
    let mut tags = Vec::new();
    let mut cursor = 0;

    for tag in extract(text) {
        out.push_str(&text[cursor..tag.range.start]);
        let result = evaluate_body(&tag.body, table);
        match &result {
            Ok(value) => out.push_str(value),
            Err(reason) => {
                warn!("Query tag '{}' unavailable: {}", tag.body, reason);
                out.push_str(UNAVAILABLE);
            }
        }
        tags.push(TagOutcome { body: tag.body, result });
        cursor = tag.range.end;
    }
    out.push_str(&text[cursor..]);

    SpliceOutcome { text: out, tags }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawRecord, ResaleRecord};

    fn record(town: &str, flat_type: &str, month: &str, price: &str) -> ResaleRecord {
        ResaleRecord::from_raw(RawRecord {
            month: Some(month.to_string()),
            town: Some(town.to_string()),
            flat_type: Some(flat_type.to_string()),
            floor_area_sqm: Some("100".to_string()),
            resale_price: Some(price.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn table() -> ResaleTable {
        ResaleTable::new(vec![
            record("BEDOK", "4 ROOM", "2023-01", "400000"),
            record("BEDOK", "4 ROOM", "2023-06", "500000"),
            record("ANG MO KIO", "3 ROOM", "2022-03", "350000"),
        ])
    }

    #[test]
    fn test_extract_both_delimiters() {
        let text = "A is [QUERY]mean resale_price[/QUERY] and B is [qq]count[/QQ].";
        let tags = extract(text);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].body, "mean resale_price");
        assert_eq!(tags[1].body, "count");
        assert_eq!(&text[tags[0].range.clone()], "[QUERY]mean resale_price[/QUERY]");
    }

    #[test]
    fn test_extract_ignores_mismatched_delimiters() {
        assert!(extract("[QUERY]mean resale_price[/QQ]").is_empty());
    }

    #[test]
    fn test_extract_strips_backticks_and_newlines() {
        let tags = extract("[QUERY]\n`median resale_price`\n[/QUERY]");
        assert_eq!(tags[0].body, "median resale_price");
    }

    #[test]
    fn test_parse_full_query() {
        let q = parse("mean resale_price where town = \"ang mo kio\" and flat_type = 3 room and year >= 2022").unwrap();
        assert_eq!(q.aggregate, Aggregate::Mean);
        assert_eq!(q.column, NumericColumn::ResalePrice);
        assert_eq!(q.filter.predicates().len(), 3);
        assert_eq!(q.filter.predicates()[0].to_string(), "town = ang mo kio");
        assert_eq!(q.filter.predicates()[2].to_string(), "year >= 2022");
    }

    #[test]
    fn test_parse_unquoted_multiword_value() {
        let q = parse("count where town = ang mo kio").unwrap();
        assert_eq!(q.aggregate, Aggregate::Count);
        assert_eq!(q.column, NumericColumn::ResalePrice);
        assert_eq!(q.filter.predicates()[0].to_string(), "town = ang mo kio");
    }

    #[test]
    fn test_parse_of_keyword() {
        let q = parse("average of floor_area_sqm").unwrap();
        assert_eq!(q.column, NumericColumn::FloorAreaSqm);
        assert!(q.filter.is_empty());
    }

    #[test]
    fn test_parse_rejects_code() {
        assert!(parse("df['resale_price'].mean()").is_err());
        assert!(parse("__import__('os').system('ls')").is_err());
        assert!(parse("mean resale_price where town = bedok; drop").is_ok_and(|q| q.filter.predicates().len() == 1));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("mean").is_err());
        assert!(parse("mean bananas").is_err());
        assert!(parse("mean resale_price town = bedok").is_err());
        assert!(parse("mean resale_price where colour = red").is_err());
        assert!(parse("mean resale_price where town bedok").is_err());
        assert!(parse("mean resale_price where town = ").is_err());
        assert!(parse("mean resale_price where year = soon").is_err());
        assert!(parse("mean resale_price where town = \"bedok").is_err());
        assert!(parse("mean resale_price where town =< bedok").is_err());
    }

    #[test]
    fn test_evaluate_and_format() {
        let t = table();
        assert_eq!(
            evaluate_body("mean resale_price where town = bedok", &t).unwrap(),
            "$450,000.00"
        );
        assert_eq!(evaluate_body("count where year = 2023", &t).unwrap(), "2");
        assert_eq!(evaluate_body("max floor_area_sqm", &t).unwrap(), "100.0 sqm");
    }

    #[test]
    fn test_evaluate_no_rows() {
        let t = table();
        let err = evaluate_body("mean resale_price where town = punggol", &t).unwrap_err();
        assert!(err.contains("punggol"));
    }

    #[test]
    fn test_splice_replaces_tags() {
        let t = table();
        let reply = "In Bedok, 4-room flats averaged [QUERY]mean resale_price where town = bedok and flat_type = 4 room[/QUERY] across [QQ]count where town = bedok[/QQ] sales.";
        let outcome = splice(reply, &t);
        assert_eq!(
            outcome.text,
            "In Bedok, 4-room flats averaged $450,000.00 across 2 sales."
        );
        assert_eq!(outcome.tags.len(), 2);
        assert_eq!(outcome.failed(), 0);
    }

    #[test]
    fn test_splice_marks_failures() {
        let t = table();
        let outcome = splice("Value: [QUERY]explode()[/QUERY]!", &t);
        assert_eq!(outcome.text, "Value: N/A!");
        assert_eq!(outcome.failed(), 1);
    }

    #[test]
    fn test_splice_without_tags_is_identity() {
        let t = table();
        let outcome = splice("Nothing to see here.", &t);
        assert_eq!(outcome.text, "Nothing to see here.");
        assert!(outcome.tags.is_empty());
    }
}
