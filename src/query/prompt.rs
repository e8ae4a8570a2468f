//! Prompt construction for the general-query assistant and affordability advice.

use crate::affordability::{AffordabilityInput, AffordabilityResult, MarketComparison};
use crate::config::LlmConfig;
use crate::data::DataSummary;
use crate::format;
use crate::llm::CompletionRequest;

const ASSISTANT_ROLE: &str = "You are an assistant that answers questions about the Singapore HDB resale flat market \
using a table of past resale transactions.";

/// Build the request for a free-text question about the loaded data.
///
/// The system prompt carries the data summary and teaches the model the tag
/// syntax it must use for any figure computed from the table.
pub fn general_query_prompt(summary: &DataSummary, query: &str, config: &LlmConfig) -> CompletionRequest {
    let mut system = String::new();

    system.push_str(ASSISTANT_ROLE);
    system.push_str("\n\n");

    system.push_str("## Data\n\n");
    system.push_str(&summary.to_string());
    system.push('\n');

    system.push_str("## Computing figures\n\n");
    system.push_str("Never guess numbers from the table. Wherever a figure is needed, write a query tag and it will be ");
    system.push_str("replaced with the computed value before the user sees your answer:\n\n");
    system.push_str("    [QUERY]<aggregate> <column> where <field> <op> <value> and ...[/QUERY]\n\n");
    system.push_str("- aggregate: mean, median, min, max, count, sum\n");
    system.push_str("- column: resale_price, floor_area_sqm, lease_commence_date, price_per_sqm\n");
    system.push_str("- field: town, flat_type, flat_model, storey_range, street_name, year, month, floor_area_sqm, resale_price\n");
    system.push_str("- op: =, !=, >, <, >=, <=\n");
    system.push_str("- text values are lowercase as listed above; months are written YYYY-MM\n");
    system.push_str("- the `where` clause is optional; `count` needs no column\n\n");
    system.push_str("Example: 4-room flats in Bedok sold for an average of ");
    system.push_str("[QUERY]mean resale_price where town = bedok and flat_type = 4 room and year = 2023[/QUERY] in 2023.\n\n");
    system.push_str("Write only the tag where the number belongs. Do not write code.\n\n");

    system.push_str("## Answer style\n\n");
    system.push_str("Answer concisely in plain text. If the question is not about HDB resale flats, say so briefly.");

    CompletionRequest::new(system)
        .with_user_message(query.trim())
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature)
}

/// Build the request for narrative advice on an affordability result.
pub fn affordability_prompt(
    input: &AffordabilityInput,
    result: &AffordabilityResult,
    market: Option<&MarketComparison>,
    config: &LlmConfig,
) -> CompletionRequest {
    let mut system = String::new();
    system.push_str("You are a careful housing-finance assistant for buyers of Singapore HDB resale flats. ");
    system.push_str("Give practical, plain-language advice in at most three short paragraphs. ");
    system.push_str("Do not invent prices; use only the figures provided. ");
    system.push_str("End by reminding the user that this is an estimate and not financial advice.");

    let mut user = String::new();
    user.push_str("## Buyer\n\n");
    user.push_str(&format!("- Monthly household income: {}\n", format::currency(input.monthly_income)));
    user.push_str(&format!("- Savings (CPF + cash): {}\n", format::currency(input.savings)));
    user.push_str(&format!("- Monthly debts: {}\n", format::currency(input.monthly_debts)));
    user.push_str(&format!("- Loan tenure: {} years\n\n", input.loan_tenure_years));

    user.push_str("## Estimate\n\n");
    user.push_str(&format!(
        "- Interest-rate haircut: {:.1}%\n",
        result.interest_rate * 100.0
    ));
    user.push_str(&format!("- Maximum loan: {}\n", format::currency(result.max_loan)));
    user.push_str(&format!("- Affordable price: {}\n\n", format::currency(result.affordable_price)));

    if let Some(market) = market {
        user.push_str("## Market\n\n");
        user.push_str(&format!("- Segment: {}\n", market.description));
        match (market.median_price, market.mean_price) {
            (Some(median), Some(mean)) => {
                user.push_str(&format!("- Median resale price: {}\n", format::currency(median)));
                user.push_str(&format!("- Mean resale price: {}\n", format::currency(mean)));
                user.push_str(&format!("- Transactions: {}\n\n", market.transactions));
            }
            _ => user.push_str("- No transactions recorded for this segment\n\n"),
        }
    }

    user.push_str("How should this buyer approach the resale market?");

    CompletionRequest::new(system)
        .with_user_message(user)
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature)
}
