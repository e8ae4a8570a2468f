//! hdb-advisor - HDB resale price advisor
//!
//! Loads Singapore HDB resale transactions from CSV, answers questions about
//! them through keyword intents, text search and an LLM whose replies can cite
//! computed figures, and estimates what a buyer can afford.

pub mod affordability;
pub mod auth;
pub mod config;
pub mod content;
pub mod data;
pub mod error;
pub mod format;
pub mod llm;
pub mod query;
pub mod tui;

pub use error::{AdvisorError, Result};
