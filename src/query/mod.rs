//! General-query assistant
//!
//! This module provides:
//! - Keyword intent classification with entity extraction
//! - The `[QUERY]` / `[QQ]` tag language the LLM uses to cite figures
//! - Prompt construction
//! - QueryRouter, which picks between analytics, text search and the LLM

pub mod intent;
pub mod prompt;
pub mod router;
pub mod tags;

pub use crate::config::QueryMode;
pub use intent::{Intent, ParsedQuery, classify};
pub use router::{Answer, NO_ANSWER, QueryRouter};
pub use tags::{DataQuery, SpliceOutcome, TagMatch, TagOutcome, UNAVAILABLE, extract, parse, splice};
