//! General-query pipeline integration tests
//!
//! Loads CSV fixtures from disk and answers questions through the router with
//! a scripted LLM client.

mod common;

use std::sync::Arc;

use hdb_advisor::config::{Config, QueryMode};
use hdb_advisor::data::load_dir;
use hdb_advisor::error::{AdvisorError, GENERIC_ERROR};
use hdb_advisor::llm::{LlmClient, MockLlmClient};
use hdb_advisor::query::{Answer, NO_ANSWER, QueryRouter, UNAVAILABLE};
use tempfile::TempDir;

fn router(mode: QueryMode, llm: Option<Arc<MockLlmClient>>) -> QueryRouter {
    let dir = common::data_dir();
    let (table, _) = load_dir(dir.path()).unwrap();
    let mut config = Config::default();
    config.query.mode = mode;
    QueryRouter::new(Arc::new(table), llm.map(|m| m as Arc<dyn LlmClient>), &config)
}

#[test]
fn test_load_dir_concatenates_and_skips_bad_rows() {
    let dir = common::data_dir();
    let (table, report) = load_dir(dir.path()).unwrap();
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.rows, 4);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(table.len(), 4);
    assert_eq!(table.towns(), vec!["ang mo kio", "bedok", "tampines"]);
}

#[test]
fn test_load_dir_without_csv_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not data").unwrap();
    let err = load_dir(dir.path()).unwrap_err();
    assert!(matches!(err, AdvisorError::NoData(_)));
    assert_eq!(err.user_message(), GENERIC_ERROR);
}

#[tokio::test]
async fn test_average_price_intent() {
    let mock = Arc::new(MockLlmClient::new());
    let router = router(QueryMode::Hybrid, Some(mock.clone()));

    let answer = router.answer("What is the average price of a 4 room flat in Bedok?").await.unwrap();
    match &answer {
        Answer::Average { mean, count, .. } => {
            assert_eq!(*mean, 450000.0);
            assert_eq!(*count, 2);
        }
        other => panic!("expected average, got {:?}", other),
    }
    assert!(answer.to_string().contains("$450,000.00 across 2 transactions"));
    assert_eq!(mock.call_count(), 0, "intents never reach the LLM");
}

#[tokio::test]
async fn test_price_trend_intent() {
    let router = router(QueryMode::Hybrid, None);

    let answer = router.answer("show the price trend in bedok").await.unwrap();
    match &answer {
        Answer::Trend { trend, .. } => {
            assert_eq!(trend.points.len(), 2);
            assert_eq!(trend.change_percent(), Some(25.0));
        }
        other => panic!("expected trend, got {:?}", other),
    }
    assert!(answer.to_string().contains("Change over the period: +25.0%"));
}

#[tokio::test]
async fn test_recognized_question_without_rows() {
    let router = router(QueryMode::Hybrid, None);
    let answer = router.answer("average price in bedok in 2019").await.unwrap();
    assert!(matches!(answer, Answer::NoData { .. }));
}

#[tokio::test]
async fn test_text_search_fallback() {
    let mock = Arc::new(MockLlmClient::new());
    let router = router(QueryMode::Hybrid, Some(mock.clone()));

    let answer = router.answer("tampines st 21").await.unwrap();
    match &answer {
        Answer::Rows { records, total } => {
            assert_eq!(*total, 1);
            assert_eq!(records[0].block, "201");
        }
        other => panic!("expected rows, got {:?}", other),
    }
    assert!(answer.to_string().starts_with("Search Results (1 of 1):"));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_llm_reply_tags_are_evaluated() {
    let mock = Arc::new(MockLlmClient::with_reply(
        "Bedok 4-room flats averaged [QUERY]mean resale_price where town = bedok and flat_type = 4 room[/QUERY] \
         over [QQ]count where town = bedok[/QQ] sales, the largest being [QUERY]max floor_area_sqm where town = bedok[/QUERY].",
    ));
    let router = router(QueryMode::Hybrid, Some(mock.clone()));

    let answer = router.answer("Is Bedok a good place to buy?").await.unwrap();
    match &answer {
        Answer::Llm { text, tags } => {
            assert_eq!(
                text,
                "Bedok 4-room flats averaged $450,000.00 over 2 sales, the largest being 93.0 sqm."
            );
            assert_eq!(tags.len(), 3);
            assert!(tags.iter().all(|t| t.result.is_ok()));
        }
        other => panic!("expected llm answer, got {:?}", other),
    }

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].last_user_message(), Some("Is Bedok a good place to buy?"));
    assert!(requests[0].system.contains("[QUERY]"));
}

#[tokio::test]
async fn test_llm_reply_with_bad_tag() {
    let mock = Arc::new(MockLlmClient::with_reply(
        "Prices are [QUERY]df['resale_price'].mean()[/QUERY] on average.",
    ));
    let router = router(QueryMode::Hybrid, Some(mock));

    match router.answer("how are prices overall?").await.unwrap() {
        Answer::Llm { text, tags } => {
            assert_eq!(text, format!("Prices are {} on average.", UNAVAILABLE));
            assert!(tags[0].result.is_err());
        }
        other => panic!("expected llm answer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_llm_failure_shows_generic_message() {
    let mock = Arc::new(MockLlmClient::new());
    mock.push_error(AdvisorError::Llm("API error 500: upstream".to_string()));
    let router = router(QueryMode::Hybrid, Some(mock));

    let err = router.answer("is now a good time to buy?").await.unwrap_err();
    assert_eq!(err.user_message(), GENERIC_ERROR);
}

#[tokio::test]
async fn test_offline_mode_never_calls_llm() {
    let mock = Arc::new(MockLlmClient::with_reply("unused"));
    let router = router(QueryMode::Offline, Some(mock.clone()));

    let answer = router.answer("is now a good time to buy?").await.unwrap();
    assert_eq!(answer, Answer::Text(NO_ANSWER.to_string()));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_llm_always_mode_skips_intents() {
    let mock = Arc::new(MockLlmClient::with_reply("About [QQ]count[/QQ] sales are on record."));
    let router = router(QueryMode::LlmAlways, Some(mock.clone()));

    let answer = router.answer("average price in bedok").await.unwrap();
    assert_eq!(answer.to_string(), "About 4 sales are on record.");
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_empty_query() {
    let router = router(QueryMode::Hybrid, None);
    let err = router.answer("   ").await.unwrap_err();
    assert_eq!(err.user_message(), "Please enter a query.");
}
