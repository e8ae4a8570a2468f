//! Application state for the TUI.
//!
//! This module defines the core state types that drive the TUI:
//! - `AppState`: All mutable application state
//! - `Focus`: Whether keys go to the sidebar or the current page
//! - `AffordForm` / `QueryPage` / `LoginForm`: per-page state
//! - `PendingAction`: Work queued by key handling for the runner

use super::input::TextInput;
use crate::affordability::{AffordabilityInput, AffordabilityResult, MarketComparison};
use crate::auth::Session;
use crate::content::Page;
use crate::query::Answer;

/// The primary application state.
///
/// Owned by `App` and updated in response to key events and by the runner
/// when pending actions complete.
#[derive(Debug, Default)]
pub struct AppState {
    /// Currently selected page
    pub page: Page,
    /// Where key presses go
    pub focus: Focus,
    /// Login state
    pub session: Session,
    pub login: LoginForm,
    pub afford: AffordForm,
    pub query: QueryPage,
    /// Scroll offset for the static pages
    pub scroll: u16,
    /// One-line message in the footer
    pub status_message: Option<String>,
    /// Whether the LLM can be reached
    pub llm_available: bool,
    /// Rows loaded from the data directory
    pub rows_loaded: usize,

    // Pending actions (processed by runner)
    pub pending_action: Option<PendingAction>,

    // Control flags
    /// Whether the application should quit
    pub should_quit: bool,
}

impl AppState {
    /// Create a new default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a page from the sidebar.
    pub fn select_page(&mut self, page: Page) {
        if self.page != page {
            self.page = page;
            self.scroll = 0;
        }
    }

    /// Whether the focused widget is a text field, so printable keys are input.
    pub fn is_typing(&self) -> bool {
        if !self.session.authenticated {
            return true;
        }
        self.focus == Focus::Content
            && match self.page {
                Page::GeneralQuery => true,
                Page::Affordability => !self.afford.on_toggle(),
                _ => false,
            }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

/// Where key presses go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Sidebar,
    Content,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Focus::Sidebar => Focus::Content,
            Focus::Content => Focus::Sidebar,
        }
    }
}

/// Password prompt shown before anything else.
#[derive(Debug, Default)]
pub struct LoginForm {
    pub password: TextInput,
    /// Last login result message
    pub error: Option<String>,
}

/// Labels of the affordability text fields, in form order.
pub const AFFORD_FIELDS: [&str; 6] = [
    "Monthly household income",
    "Total savings (CPF + cash)",
    "Monthly debts (e.g. loans)",
    "Loan tenure (years)",
    "Desired town (optional)",
    "Desired flat type (optional)",
];

/// Affordability calculator form and its latest result.
#[derive(Debug)]
pub struct AffordForm {
    pub fields: [TextInput; 6],
    /// Selected row; `AFFORD_FIELDS.len()` is the advice toggle
    pub selected: usize,
    pub want_advice: bool,
    pub result: Option<AffordabilityResult>,
    pub market: Option<MarketComparison>,
    pub advice: Option<String>,
    pub error: Option<String>,
}

impl Default for AffordForm {
    fn default() -> Self {
        Self {
            fields: [
                TextInput::new(),
                TextInput::with_content("0"),
                TextInput::with_content("0"),
                TextInput::with_content("25"),
                TextInput::new(),
                TextInput::new(),
            ],
            selected: 0,
            want_advice: false,
            result: None,
            market: None,
            advice: None,
            error: None,
        }
    }
}

impl AffordForm {
    /// Number of selectable rows, including the advice toggle.
    pub fn rows(&self) -> usize {
        self.fields.len() + 1
    }

    pub fn on_toggle(&self) -> bool {
        self.selected == self.fields.len()
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.rows();
    }

    pub fn select_prev(&mut self) {
        self.selected = (self.selected + self.rows() - 1) % self.rows();
    }

    pub fn selected_field(&mut self) -> Option<&mut TextInput> {
        self.fields.get_mut(self.selected)
    }

    /// Parse the text fields into calculator input.
    pub fn parse(&self) -> Result<AffordabilityInput, String> {
        let amount = |i: usize| -> Result<f64, String> {
            let text = self.fields[i].content().trim().replace(',', "");
            if text.is_empty() {
                return Ok(0.0);
            }
            text.parse::<f64>()
                .map_err(|_| format!("{} must be a number.", AFFORD_FIELDS[i]))
        };
        let optional = |i: usize| {
            let text = self.fields[i].content().trim();
            (!text.is_empty()).then(|| text.to_string())
        };

        let tenure = self.fields[3]
            .content()
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("{} must be a whole number.", AFFORD_FIELDS[3]))?;

        Ok(AffordabilityInput {
            monthly_income: amount(0)?,
            savings: amount(1)?,
            monthly_debts: amount(2)?,
            loan_tenure_years: tenure,
            desired_town: optional(4),
            desired_flat_type: optional(5),
        })
    }

    pub fn clear_output(&mut self) {
        self.result = None;
        self.market = None;
        self.advice = None;
        self.error = None;
    }
}

/// General-query page: input line and the latest answer.
#[derive(Debug, Default)]
pub struct QueryPage {
    pub input: TextInput,
    /// Question the current answer belongs to
    pub last_query: Option<String>,
    pub answer: Option<Answer>,
    pub error: Option<String>,
    pub scroll: u16,
}

/// Work queued by key handling, processed by the runner after the key event.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Check a password against the gate
    Login(String),
    /// Answer a general query
    SubmitQuery(String),
    /// Run the affordability calculator, optionally asking for advice
    Calculate { input: AffordabilityInput, advice: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_default() {
        let state = AppState::new();
        assert_eq!(state.page, Page::Main);
        assert_eq!(state.focus, Focus::Sidebar);
        assert!(!state.session.authenticated);
        assert!(state.pending_action.is_none());
        assert!(!state.should_quit);
    }

    #[test]
    fn test_select_page_resets_scroll() {
        let mut state = AppState::new();
        state.scroll = 7;
        state.select_page(Page::AboutUs);
        assert_eq!(state.scroll, 0);
        assert_eq!(state.page, Page::AboutUs);
    }

    #[test]
    fn test_is_typing() {
        let mut state = AppState::new();
        assert!(state.is_typing(), "login prompt takes typed keys");

        state.session.authenticated = true;
        assert!(!state.is_typing());

        state.focus = Focus::Content;
        state.page = Page::GeneralQuery;
        assert!(state.is_typing());

        state.page = Page::AboutUs;
        assert!(!state.is_typing());

        state.page = Page::Affordability;
        assert!(state.is_typing());
        state.afford.selected = AFFORD_FIELDS.len();
        assert!(!state.is_typing());
    }

    #[test]
    fn test_afford_selection_wraps() {
        let mut form = AffordForm::default();
        form.select_prev();
        assert!(form.on_toggle());
        form.select_next();
        assert_eq!(form.selected, 0);
    }

    #[test]
    fn test_afford_parse() {
        let mut form = AffordForm::default();
        form.fields[0] = TextInput::with_content("8,000");
        form.fields[1] = TextInput::with_content("120000");
        form.fields[4] = TextInput::with_content(" Bedok ");

        let input = form.parse().unwrap();
        assert_eq!(input.monthly_income, 8000.0);
        assert_eq!(input.savings, 120000.0);
        assert_eq!(input.monthly_debts, 0.0);
        assert_eq!(input.loan_tenure_years, 25);
        assert_eq!(input.desired_town.as_deref(), Some("Bedok"));
        assert!(input.desired_flat_type.is_none());
    }

    #[test]
    fn test_afford_parse_errors() {
        let mut form = AffordForm::default();
        form.fields[0] = TextInput::with_content("lots");
        assert_eq!(form.parse().unwrap_err(), "Monthly household income must be a number.");

        let mut form = AffordForm::default();
        form.fields[3] = TextInput::with_content("2.5");
        assert!(form.parse().unwrap_err().contains("whole number"));
    }
}
