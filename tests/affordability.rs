//! Affordability calculator integration tests
//!
//! Runs the calculator against CSV fixtures and checks the market comparison
//! and the LLM advice request.

mod common;

use hdb_advisor::affordability::{self, AffordabilityInput, DEFAULT_INTEREST_RATE, MAX_TENURE_YEARS};
use hdb_advisor::config::LlmConfig;
use hdb_advisor::data::load_dir;
use hdb_advisor::llm::MockLlmClient;

fn input(town: Option<&str>, flat_type: Option<&str>) -> AffordabilityInput {
    AffordabilityInput {
        monthly_income: 5000.0,
        savings: 50000.0,
        monthly_debts: 1000.0,
        loan_tenure_years: 25,
        desired_town: town.map(str::to_string),
        desired_flat_type: flat_type.map(str::to_string),
    }
}

#[test]
fn test_calculate_with_defaults() {
    let input = input(None, None);
    input.validate(MAX_TENURE_YEARS).unwrap();

    let result = affordability::calculate(&input, DEFAULT_INTEREST_RATE);
    // 4000 * 12 * 25 * 0.975
    assert!((result.max_loan - 1_170_000.0).abs() < 1e-6);
    assert!((result.affordable_price - 1_220_000.0).abs() < 1e-6);
    assert!(result.headline().contains("$1,220,000.00"));
}

#[test]
fn test_market_comparison_from_csv() {
    let dir = common::data_dir();
    let (table, _) = load_dir(dir.path()).unwrap();

    let bedok = input(Some("Bedok"), Some("4 ROOM"));
    let result = affordability::calculate(&bedok, DEFAULT_INTEREST_RATE);
    let market = affordability::market_comparison(&table, &bedok, &result).unwrap();
    assert_eq!(market.transactions, 2);
    assert_eq!(market.median_price, Some(450000.0));
    assert_eq!(market.within_budget, Some(true));
    assert!(market.summary_line().contains("within your budget"));

    let unknown = AffordabilityInput {
        desired_town: Some("Punggol".to_string()),
        ..bedok.clone()
    };
    let market = affordability::market_comparison(&table, &unknown, &result).unwrap();
    assert_eq!(market.transactions, 0);
    assert!(market.summary_line().starts_with("No resale transactions found"));

    assert!(affordability::market_comparison(&table, &input(None, None), &result).is_none());
}

#[test]
fn test_invalid_input_is_reported() {
    let mut bad = input(None, None);
    bad.loan_tenure_years = MAX_TENURE_YEARS + 5;
    let err = bad.validate(MAX_TENURE_YEARS).unwrap_err();
    assert!(err.user_message().contains("Loan tenure must be between 1 and 30 years."));
}

#[tokio::test]
async fn test_advice_request_carries_figures() {
    let dir = common::data_dir();
    let (table, _) = load_dir(dir.path()).unwrap();
    let mock = MockLlmClient::with_reply("Bedok fits comfortably within your budget.");

    let input = input(Some("bedok"), None);
    let result = affordability::calculate(&input, DEFAULT_INTEREST_RATE);
    let market = affordability::market_comparison(&table, &input, &result);

    let advice = affordability::advise(&mock, &input, &result, market.as_ref(), &LlmConfig::default())
        .await
        .unwrap();
    assert_eq!(advice, "Bedok fits comfortably within your budget.");

    let requests = mock.requests();
    let prompt = requests[0].last_user_message().unwrap();
    assert!(prompt.contains("$1,170,000.00"));
    assert!(prompt.contains("bedok"));
}
