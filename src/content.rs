//! Static page text and the page list.

/// Pages reachable from the sidebar, in sidebar order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Main,
    Affordability,
    GeneralQuery,
    AboutUs,
    Methodology,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Main,
        Page::Affordability,
        Page::GeneralQuery,
        Page::AboutUs,
        Page::Methodology,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Main => "Main",
            Page::Affordability => "Affordability Calculator",
            Page::GeneralQuery => "General Query on HDB",
            Page::AboutUs => "About Us",
            Page::Methodology => "Methodology",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Static body for pages that have one.
    pub fn static_text(self) -> Option<&'static str> {
        match self {
            Page::AboutUs => Some(ABOUT_US),
            Page::Methodology => Some(METHODOLOGY),
            _ => None,
        }
    }
}

pub const DISCLAIMER: &str = "IMPORTANT NOTICE: This application is a prototype developed for educational purposes only. \
The information provided here is NOT intended for real-world usage and should not be relied upon for making any \
decisions, especially those related to financial, legal, or healthcare matters.";

pub const DISCLAIMER_DETAIL: &str = "Furthermore, please be aware that the LLM may generate inaccurate or incorrect \
information. You assume full responsibility for how you use any generated output. Always consult with qualified \
professionals for accurate and personalized advice.";

pub const ABOUT_US: &str = "\
## Project Scope
This application helps users navigate the HDB resale market. It offers two main features: a general query \
assistant and a housing affordability calculator.

## Objectives
- Let users ask general questions about HDB resale prices and receive answers grounded in resale transaction data, \
with an LLM filling in where the data alone cannot answer.
- Give users an easy way to estimate their housing affordability from their current income and savings and the \
home they want, with optional personalized advice from the LLM.

## Data Sources
Resale Flat Prices from data.gov.sg: https://data.gov.sg/collections/189/view

## Features
- General query assistant (General Query on HDB)
- Housing affordability calculator (Affordability Calculator)
- Step-by-step guidance on the buying process
- FAQ section for common queries

## Pages
Affordability Calculator - Enter your finances and desired home to estimate what you can afford.
General Query on HDB - Ask questions about HDB resale data.
About Us - About this project.
Methodology - How the answers are produced.
";

pub const METHODOLOGY: &str = "\
## Data Flows
1. General Query on HDB: the query is lowercased and checked for known intents (average resale price, price trend) \
and entities (flat type, year, town). Recognized intents are answered directly from the resale table. Otherwise \
the table is searched for rows containing the query text. If nothing matches, the question goes to the LLM along \
with a summary of the data; any [QUERY] tags in its reply are computed against the table and substituted in.
2. Housing Affordability Calculator: household income, savings, monthly debts and loan tenure give a maximum loan \
of (income - debts) x 12 x tenure x (1 - 2.5%), and an affordable price of that loan plus savings. When a town or \
flat type is given, the estimate is compared with the median resale price for that segment. The figures can be \
passed to the LLM for narrative advice.

## Flowcharts
Use Case 1: General Query on HDB
  query -> intent match? -> average / trend from data
        -> text search hit? -> matching rows
        -> LLM with data summary -> evaluate [QUERY] tags -> answer

Use Case 2: Housing Affordability Calculator
  inputs -> validate -> max loan + savings -> market comparison -> (optional) LLM advice
";

/// Steps to buy an HDB resale flat, in order.
pub const STEPS: [&str; 4] = [
    "Step 1: Check your eligibility",
    "Step 2: Choose a resale flat",
    "Step 3: Apply for HDB loan",
    "Step 4: Complete the purchase",
];

/// Frequently asked questions and their answers.
pub const FAQS: [(&str, &str); 2] = [
    (
        "What is the minimum downpayment?",
        "The minimum downpayment is 25% of the purchase price.",
    ),
    (
        "How long does the buying process take?",
        "The process typically takes around 3-6 months.",
    ),
];

/// Reply for questions not in [`FAQS`].
pub const FAQ_FALLBACK: &str = "I'm sorry, I don't have that information.";

/// Answer a question from [`FAQS`]. The question must match one of the listed
/// questions, ignoring case and surrounding whitespace.
pub fn faq_answer(question: &str) -> &'static str {
    let question = question.trim();
    FAQS.iter()
        .find(|(q, _)| q.eq_ignore_ascii_case(question))
        .map_or(FAQ_FALLBACK, |(_, answer)| answer)
}

/// Buying steps followed by the FAQ, as shown on the Main page and by `hdb-advisor guide`.
pub fn buying_guide() -> String {
    let mut text = String::from("## Steps to Buy an HDB Flat\n");
    for step in STEPS {
        text.push_str(step);
        text.push('\n');
    }
    text.push_str("\n## Frequently Asked Questions\n");
    for (question, answer) in FAQS {
        text.push_str(&format!("{}: {}\n", question, answer));
    }
    text
}
