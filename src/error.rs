//! Error types for hdb-advisor
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Message shown to the user whenever answering a query fails.
pub const GENERIC_ERROR: &str = "Sorry, something went wrong while answering your query. Please try again.";

/// All error types that can occur in hdb-advisor
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// No CSV files (or no usable rows) in the data directory
    #[error("No resale data found in {}", .0.display())]
    NoData(PathBuf),

    /// A CSV file could not be parsed
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Invalid glob pattern for the data directory
    #[error("Invalid data path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// User submitted a blank query
    #[error("Please enter a query.")]
    EmptyQuery,

    /// Invalid user input (affordability form, CLI values)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An embedded data query could not be parsed
    #[error("Query tag error: {0}")]
    QueryTag(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// LLM is not configured (missing API key) but the request needed it
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// Password hashing or verification failure
    #[error("Auth error: {0}")]
    Auth(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdvisorError {
    /// Text suitable for showing to the user.
    ///
    /// Input problems are reported as-is; everything else collapses into
    /// [`GENERIC_ERROR`].
    pub fn user_message(&self) -> String {
        match self {
            AdvisorError::EmptyQuery | AdvisorError::InvalidInput(_) => self.to_string(),
            _ => GENERIC_ERROR.to_string(),
        }
    }
}

/// Result type alias for hdb-advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_error() {
        let err = AdvisorError::NoData(PathBuf::from("data"));
        assert_eq!(err.to_string(), "No resale data found in data");
    }

    #[test]
    fn test_empty_query_error() {
        let err = AdvisorError::EmptyQuery;
        assert_eq!(err.to_string(), "Please enter a query.");
    }

    #[test]
    fn test_llm_error() {
        let err = AdvisorError::Llm("rate limited".to_string());
        assert_eq!(err.to_string(), "LLM error: rate limited");
    }

    #[test]
    fn test_user_message_hides_internal_errors() {
        let err = AdvisorError::Llm("API error 500: boom".to_string());
        assert_eq!(err.user_message(), GENERIC_ERROR);

        let err = AdvisorError::Io(std::io::Error::other("disk gone"));
        assert_eq!(err.user_message(), GENERIC_ERROR);
    }

    #[test]
    fn test_user_message_keeps_input_errors() {
        assert_eq!(AdvisorError::EmptyQuery.user_message(), "Please enter a query.");

        let err = AdvisorError::InvalidInput("loan tenure must be between 1 and 30 years".to_string());
        assert!(err.user_message().contains("loan tenure"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AdvisorError = io_err.into();
        assert!(matches!(err, AdvisorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(AdvisorError::EmptyQuery)
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
