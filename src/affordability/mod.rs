//! Affordability calculator
//!
//! This module provides:
//! - Input validation for the calculator form
//! - The maximum-loan / affordable-price estimate
//! - A comparison against resale prices for the desired segment
//! - Optional narrative advice from the LLM

use log::{debug, info};
use serde::Serialize;

use crate::config::LlmConfig;
use crate::data::{RecordFilter, ResaleTable};
use crate::error::{AdvisorError, Result};
use crate::format;
use crate::llm::LlmClient;
use crate::query::prompt::affordability_prompt;

/// Assumed annual interest-rate haircut applied to the loan.
pub const DEFAULT_INTEREST_RATE: f64 = 0.025;

/// Longest loan tenure accepted, in years.
pub const MAX_TENURE_YEARS: u32 = 30;

/// Calculator form values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffordabilityInput {
    pub monthly_income: f64,
    /// CPF plus cash
    pub savings: f64,
    pub monthly_debts: f64,
    pub loan_tenure_years: u32,
    pub desired_town: Option<String>,
    pub desired_flat_type: Option<String>,
}

impl AffordabilityInput {
    /// Reject negative or non-finite amounts and tenures outside 1..=`max_tenure`.
    pub fn validate(&self, max_tenure: u32) -> Result<()> {
        for (name, value) in [
            ("Monthly income", self.monthly_income),
            ("Savings", self.savings),
            ("Monthly debts", self.monthly_debts),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AdvisorError::InvalidInput(format!("{} must be a non-negative amount.", name)));
            }
        }
        if !(1..=max_tenure).contains(&self.loan_tenure_years) {
            return Err(AdvisorError::InvalidInput(format!(
                "Loan tenure must be between 1 and {} years.",
                max_tenure
            )));
        }
        Ok(())
    }

    fn segment_filter(&self) -> Option<RecordFilter> {
        let town = self.desired_town.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let flat_type = self.desired_flat_type.as_deref().map(str::trim).filter(|t| !t.is_empty());
        if town.is_none() && flat_type.is_none() {
            return None;
        }
        let mut filter = RecordFilter::new();
        if let Some(town) = town {
            filter = filter.town(town);
        }
        if let Some(flat_type) = flat_type {
            filter = filter.flat_type(flat_type);
        }
        Some(filter)
    }
}

/// Outcome of the estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffordabilityResult {
    pub interest_rate: f64,
    pub max_loan: f64,
    pub affordable_price: f64,
}

impl AffordabilityResult {
    /// Sentence shown under the form.
    pub fn headline(&self) -> String {
        format!(
            "Based on your inputs, you can afford an HDB resale flat worth approximately {}.",
            format::currency(self.affordable_price)
        )
    }
}

/// Compute the maximum loan and affordable price.
///
/// The loan never goes below zero, so debts larger than income leave only
/// savings.
pub fn calculate(input: &AffordabilityInput, interest_rate: f64) -> AffordabilityResult {
    let net_monthly = input.monthly_income - input.monthly_debts;
    let max_loan = (net_monthly * 12.0 * input.loan_tenure_years as f64 * (1.0 - interest_rate)).max(0.0);
    let affordable_price = max_loan + input.savings;

    debug!(
        "affordability: net_monthly={} tenure={} rate={} max_loan={} affordable={}",
        net_monthly, input.loan_tenure_years, interest_rate, max_loan, affordable_price
    );

    AffordabilityResult {
        interest_rate,
        max_loan,
        affordable_price,
    }
}

/// Resale prices for the buyer's desired town and flat type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketComparison {
    pub description: String,
    pub transactions: usize,
    pub median_price: Option<f64>,
    pub mean_price: Option<f64>,
    /// Whether the affordable price reaches the segment median
    pub within_budget: Option<bool>,
}

impl MarketComparison {
    pub fn summary_line(&self) -> String {
        match (self.median_price, self.within_budget) {
            (Some(median), Some(true)) => format!(
                "The median price for {} is {}, which is within your budget.",
                self.description,
                format::currency(median)
            ),
            (Some(median), _) => format!(
                "The median price for {} is {}, which is above your budget.",
                self.description,
                format::currency(median)
            ),
            (None, _) => format!("No resale transactions found for {}.", self.description),
        }
    }
}

/// Compare the estimate with the desired segment. `None` when the buyer
/// named neither a town nor a flat type.
pub fn market_comparison(
    table: &ResaleTable,
    input: &AffordabilityInput,
    result: &AffordabilityResult,
) -> Option<MarketComparison> {
    let filter = input.segment_filter()?;
    let median_price = table.median_price(&filter);

    Some(MarketComparison {
        description: filter.describe(),
        transactions: table.count(&filter),
        median_price,
        mean_price: table.mean_price(&filter),
        within_budget: median_price.map(|median| result.affordable_price >= median),
    })
}

/// Ask the LLM for narrative advice on the estimate.
pub async fn advise(
    client: &dyn LlmClient,
    input: &AffordabilityInput,
    result: &AffordabilityResult,
    market: Option<&MarketComparison>,
    config: &LlmConfig,
) -> Result<String> {
    if !client.is_ready() {
        return Err(AdvisorError::LlmUnavailable(format!("{} is not ready", client.model())));
    }
    let request = affordability_prompt(input, result, market, config);
    let response = client.complete(request).await?;
    info!("Affordability advice received from {}", client.model());
    Ok(response.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawRecord, ResaleRecord};
    use crate::llm::MockLlmClient;

    fn input() -> AffordabilityInput {
        AffordabilityInput {
            monthly_income: 6000.0,
            savings: 80000.0,
            monthly_debts: 1000.0,
            loan_tenure_years: 25,
            desired_town: None,
            desired_flat_type: None,
        }
    }

    fn table() -> ResaleTable {
        let rows = [("BEDOK", "4 ROOM", "450000"), ("BEDOK", "4 ROOM", "550000"), ("BEDOK", "3 ROOM", "350000")];
        ResaleTable::new(
            rows.iter()
                .map(|(town, flat_type, price)| {
                    ResaleRecord::from_raw(RawRecord {
                        month: Some("2024-01".to_string()),
                        town: Some(town.to_string()),
                        flat_type: Some(flat_type.to_string()),
                        floor_area_sqm: Some("90".to_string()),
                        resale_price: Some(price.to_string()),
                        ..Default::default()
                    })
                    .unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn test_calculate_formula() {
        let result = calculate(&input(), DEFAULT_INTEREST_RATE);
        // (6000 - 1000) * 12 * 25 * 0.975
        assert!((result.max_loan - 1_462_500.0).abs() < 1e-6);
        assert!((result.affordable_price - 1_542_500.0).abs() < 1e-6);
        assert_eq!(
            result.headline(),
            "Based on your inputs, you can afford an HDB resale flat worth approximately $1,542,500.00."
        );
    }

    #[test]
    fn test_calculate_clamps_negative_loan() {
        let mut input = input();
        input.monthly_debts = 9000.0;
        let result = calculate(&input, DEFAULT_INTEREST_RATE);
        assert_eq!(result.max_loan, 0.0);
        assert_eq!(result.affordable_price, 80000.0);
    }

    #[test]
    fn test_calculate_zero_income() {
        let mut input = input();
        input.monthly_income = 0.0;
        input.monthly_debts = 0.0;
        assert_eq!(calculate(&input, DEFAULT_INTEREST_RATE).affordable_price, 80000.0);
    }

    #[test]
    fn test_validate() {
        assert!(input().validate(MAX_TENURE_YEARS).is_ok());

        let mut bad = input();
        bad.loan_tenure_years = 0;
        assert!(matches!(bad.validate(MAX_TENURE_YEARS), Err(AdvisorError::InvalidInput(_))));

        bad.loan_tenure_years = 31;
        assert!(bad.validate(MAX_TENURE_YEARS).is_err());

        let mut bad = input();
        bad.savings = -1.0;
        let err = bad.validate(MAX_TENURE_YEARS).unwrap_err();
        assert_eq!(err.user_message(), "Invalid input: Savings must be a non-negative amount.");

        let mut bad = input();
        bad.monthly_income = f64::NAN;
        assert!(bad.validate(MAX_TENURE_YEARS).is_err());
    }

    #[test]
    fn test_market_comparison() {
        let mut input = input();
        input.desired_town = Some("Bedok".to_string());
        input.desired_flat_type = Some("4-Room".to_string());
        let result = calculate(&input, DEFAULT_INTEREST_RATE);

        let market = market_comparison(&table(), &input, &result).unwrap();
        assert_eq!(market.description, "4 room flats in bedok");
        assert_eq!(market.transactions, 2);
        assert_eq!(market.median_price, Some(500000.0));
        assert_eq!(market.within_budget, Some(true));
        assert!(market.summary_line().contains("within your budget"));
    }

    #[test]
    fn test_market_comparison_above_budget() {
        let mut input = input();
        input.monthly_income = 1000.0;
        input.savings = 1000.0;
        input.desired_town = Some("bedok".to_string());
        let result = calculate(&input, DEFAULT_INTEREST_RATE);

        let market = market_comparison(&table(), &input, &result).unwrap();
        assert_eq!(market.within_budget, Some(false));
        assert!(market.summary_line().contains("above your budget"));
    }

    #[test]
    fn test_market_comparison_requires_segment() {
        let mut input = input();
        input.desired_town = Some("   ".to_string());
        let result = calculate(&input, DEFAULT_INTEREST_RATE);
        assert!(market_comparison(&table(), &input, &result).is_none());
    }

    #[test]
    fn test_market_comparison_no_rows() {
        let mut input = input();
        input.desired_town = Some("punggol".to_string());
        let result = calculate(&input, DEFAULT_INTEREST_RATE);
        let market = market_comparison(&table(), &input, &result).unwrap();
        assert_eq!(market.transactions, 0);
        assert_eq!(market.median_price, None);
        assert_eq!(market.summary_line(), "No resale transactions found for all flats in punggol.");
    }

    #[tokio::test]
    async fn test_advise_uses_llm() {
        let client = MockLlmClient::with_reply("Consider a 4-room flat further from the city.");
        let input = input();
        let result = calculate(&input, DEFAULT_INTEREST_RATE);

        let advice = advise(&client, &input, &result, None, &LlmConfig::default()).await.unwrap();
        assert_eq!(advice, "Consider a 4-room flat further from the city.");
        assert_eq!(client.call_count(), 1);
        assert!(client.requests()[0].last_user_message().unwrap().contains("Affordable price"));
    }

    #[tokio::test]
    async fn test_advise_propagates_errors() {
        let client = MockLlmClient::new();
        client.push_error(AdvisorError::Llm("API error 500".to_string()));
        let input = input();
        let result = calculate(&input, DEFAULT_INTEREST_RATE);
        assert!(advise(&client, &input, &result, None, &LlmConfig::default()).await.is_err());
    }
}
