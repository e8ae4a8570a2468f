//! Query routing: keyword intents, text search, then the LLM.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{Config, LlmConfig, QueryMode};
use crate::data::{PriceTrend, ResaleRecord, ResaleTable};
use crate::error::{AdvisorError, Result};
use crate::format;
use crate::llm::LlmClient;
use crate::query::intent::{Intent, ParsedQuery, classify};
use crate::query::prompt::general_query_prompt;
use crate::query::tags::{TagOutcome, splice};

/// Shown when nothing in the data answers the question and no LLM may be asked.
pub const NO_ANSWER: &str = "No matching records found, and the language model is not available to answer this question.";

/// Reply to a general query.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Mean resale price for a slice of the data
    Average { description: String, mean: f64, count: usize },
    /// Monthly mean price for a slice of the data
    Trend { description: String, trend: PriceTrend },
    /// Rows matched by the text search, capped at the display limit
    Rows { records: Vec<ResaleRecord>, total: usize },
    /// LLM reply with its query tags evaluated
    Llm { text: String, tags: Vec<TagOutcome> },
    /// A recognized question whose slice has no rows
    NoData { description: String },
    Text(String),
}

impl Answer {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Answer::Average { .. } => "average",
            Answer::Trend { .. } => "trend",
            Answer::Rows { .. } => "rows",
            Answer::Llm { .. } => "llm",
            Answer::NoData { .. } => "no_data",
            Answer::Text(_) => "text",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Average {
                description,
                mean,
                count,
            } => write!(
                f,
                "The average resale price for {} is {} across {} transactions.",
                description,
                format::currency(*mean),
                format::thousands(*count as u64)
            ),
            Answer::Trend { description, trend } => {
                writeln!(f, "Resale price trend for {}:", description)?;
                for point in trend.by_year() {
                    writeln!(
                        f,
                        "  {}  {:>14}  ({} transactions)",
                        point.year,
                        format::currency(point.mean_price),
                        format::thousands(point.transactions as u64)
                    )?;
                }
                if let Some(change) = trend.change_percent() {
                    write!(f, "Change over the period: {:+.1}%", change)?;
                }
                Ok(())
            }
            Answer::Rows { records, total } => {
                writeln!(f, "Search Results ({} of {}):", records.len(), format::thousands(*total as u64))?;
                for r in records {
                    writeln!(
                        f,
                        "  {}  {:<16} {:<10} blk {:<5} {:<24} {:>8}  {:>6.1} sqm  {}",
                        r.month.format("%Y-%m"),
                        r.town,
                        r.flat_type,
                        r.block,
                        r.street_name,
                        r.storey_range,
                        r.floor_area_sqm,
                        format::currency_whole(r.resale_price)
                    )?;
                }
                Ok(())
            }
            Answer::Llm { text, .. } => write!(f, "{}", text),
            Answer::NoData { description } => write!(f, "No data available for {}.", description),
            Answer::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Answers free-text questions about the loaded table.
pub struct QueryRouter {
    table: Arc<ResaleTable>,
    llm: Option<Arc<dyn LlmClient>>,
    llm_config: LlmConfig,
    mode: QueryMode,
    search_limit: usize,
    log_prompts: bool,
    towns: Vec<String>,
}

impl QueryRouter {
    pub fn new(table: Arc<ResaleTable>, llm: Option<Arc<dyn LlmClient>>, config: &Config) -> Self {
        let towns = table.towns();
        Self {
            table,
            llm,
            llm_config: config.llm.clone(),
            mode: config.query.mode,
            search_limit: config.data.search_limit,
            log_prompts: config.debug.log_prompts,
            towns,
        }
    }

    pub fn table(&self) -> &ResaleTable {
        &self.table
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn has_llm(&self) -> bool {
        self.llm.as_ref().is_some_and(|c| c.is_ready())
    }

    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdvisorError::EmptyQuery);
        }

        let parsed = classify(query, &self.towns);
        tracing::info!(
            mode = ?self.mode,
            intent = ?parsed.intent,
            town = parsed.town.as_deref(),
            flat_type = parsed.flat_type.as_deref(),
            year = parsed.year,
            "routing query"
        );

        let answer = match self.mode {
            QueryMode::LlmAlways => self.ask_llm(query).await?,
            QueryMode::Hybrid | QueryMode::Offline => match self.answer_from_data(&parsed) {
                Some(answer) => answer,
                None if self.mode == QueryMode::Offline => Answer::Text(NO_ANSWER.to_string()),
                None if !self.has_llm() => {
                    warn!("No LLM configured; cannot answer '{}'", query);
                    Answer::Text(NO_ANSWER.to_string())
                }
                None => self.ask_llm(query).await?,
            },
        };

        tracing::info!(kind = answer.kind(), "query answered");
        Ok(answer)
    }

    /// Intent handlers, then the whole-table text search.
    fn answer_from_data(&self, parsed: &ParsedQuery) -> Option<Answer> {
        match parsed.intent {
            Intent::AveragePrice => Some(self.average_price(parsed)),
            Intent::PriceTrend => Some(self.price_trend(parsed)),
            Intent::Unknown => self.search(&parsed.raw),
        }
    }

    fn average_price(&self, parsed: &ParsedQuery) -> Answer {
        let filter = parsed.filter();
        let description = filter.describe();
        match self.table.mean_price(&filter) {
            Some(mean) => Answer::Average {
                description,
                mean,
                count: self.table.count(&filter),
            },
            None => Answer::NoData { description },
        }
    }

    fn price_trend(&self, parsed: &ParsedQuery) -> Answer {
        let filter = parsed.filter();
        let description = filter.describe();
        let trend = self.table.price_trend(&filter);
        if trend.is_empty() {
            Answer::NoData { description }
        } else {
            Answer::Trend { description, trend }
        }
    }

    fn search(&self, text: &str) -> Option<Answer> {
        let result = self.table.search(text, self.search_limit);
        debug!("Text search for '{}' matched {} rows", text, result.total);
        (result.total > 0).then(|| Answer::Rows {
            records: result.rows.into_iter().cloned().collect(),
            total: result.total,
        })
    }

    async fn ask_llm(&self, query: &str) -> Result<Answer> {
        let client = self
            .llm
            .as_ref()
            .filter(|c| c.is_ready())
            .ok_or_else(|| AdvisorError::LlmUnavailable("no API key configured".to_string()))?;

        let request = general_query_prompt(&self.table.summary(), query, &self.llm_config);
        if self.log_prompts {
            debug!("LLM system prompt:\n{}", request.system);
        }

        let response = client.complete(request).await?;
        if self.log_prompts {
            debug!("LLM raw reply:\n{}", response.content);
        }
        info!(
            "LLM replied via {} ({} tokens)",
            client.model(),
            response.usage.total()
        );

        let outcome = splice(&response.content, &self.table);
        if outcome.failed() > 0 {
            warn!("{} of {} query tags could not be evaluated", outcome.failed(), outcome.tags.len());
        }
        Ok(Answer::Llm {
            text: outcome.text,
            tags: outcome.tags,
        })
    }
}
