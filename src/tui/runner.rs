//! TUI Runner - main event loop.
//!
//! The `TuiRunner` owns the terminal, app and input source. It runs the
//! main loop: render → handle input → process actions → repeat.

use super::Tui;
use super::app::App;
use super::events::{Input, InputSource};
use super::state::{AppState, PendingAction};
use super::views::render;
use crate::affordability::{self, AffordabilityInput};
use crate::auth::PasswordGate;
use crate::config::Config;
use crate::llm::LlmClient;
use crate::query::QueryRouter;
use eyre::Result;
use log::{error, info, warn};
use std::sync::Arc;

/// Everything pending actions need: the query router, login gate and LLM.
pub struct Services {
    pub router: QueryRouter,
    pub gate: PasswordGate,
    pub llm: Option<Arc<dyn LlmClient>>,
    pub config: Config,
}

impl Services {
    /// Initial state for a new session.
    pub fn initial_state(&self) -> AppState {
        let mut state = AppState::new();
        state.session = self.gate.session();
        state.llm_available = self.router.has_llm();
        state.rows_loaded = self.router.table().len();
        state
    }

    /// Apply one pending action to `state`.
    pub async fn apply(&self, state: &mut AppState, action: PendingAction) {
        match action {
            PendingAction::Login(password) => self.login(state, &password),
            PendingAction::SubmitQuery(query) => self.submit_query(state, query).await,
            PendingAction::Calculate { input, advice } => self.calculate(state, input, advice).await,
        }
    }

    fn login(&self, state: &mut AppState, password: &str) {
        match self.gate.login(&mut state.session, password) {
            Ok(message) => {
                state.login.error = None;
                state.set_status(message);
            }
            Err(message) => state.login.error = Some(message.to_string()),
        }
    }

    async fn submit_query(&self, state: &mut AppState, query: String) {
        state.clear_status();
        state.query.scroll = 0;
        match self.router.answer(&query).await {
            Ok(answer) => {
                state.query.answer = Some(answer);
                state.query.error = None;
            }
            Err(e) => {
                error!("Query '{}' failed: {}", query, e);
                state.query.answer = None;
                state.query.error = Some(e.user_message());
            }
        }
        state.query.last_query = Some(query);
    }

    async fn calculate(&self, state: &mut AppState, input: AffordabilityInput, want_advice: bool) {
        let form = &mut state.afford;
        form.clear_output();

        if let Err(e) = input.validate(self.config.affordability.max_tenure_years) {
            form.error = Some(e.user_message());
            return;
        }

        let result = affordability::calculate(&input, self.config.affordability.interest_rate);
        let market = affordability::market_comparison(self.router.table(), &input, &result);

        if want_advice {
            match &self.llm {
                Some(client) => {
                    match affordability::advise(client.as_ref(), &input, &result, market.as_ref(), &self.config.llm).await
                    {
                        Ok(advice) => form.advice = Some(advice),
                        Err(e) => {
                            error!("Affordability advice failed: {}", e);
                            form.error = Some(e.user_message());
                        }
                    }
                }
                None => {
                    warn!("Advice requested but no LLM is configured");
                    form.error = Some("Advice is unavailable: no LLM API key is configured.".to_string());
                }
            }
        }

        form.result = Some(result);
        form.market = market;
    }
}

/// Main TUI runner that owns the event loop.
pub struct TuiRunner {
    /// The terminal instance
    terminal: Tui,
    /// Application state and input handling
    app: App,
    input: InputSource,
    services: Services,
}

impl TuiRunner {
    /// Create a new TUI runner.
    pub fn new(terminal: Tui, services: Services) -> Self {
        let app = App::with_state(services.initial_state());
        let input = InputSource::new(services.config.tui.tick_rate_ms);
        Self {
            terminal,
            app,
            input,
            services,
        }
    }

    /// Run the main TUI loop.
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting TUI main loop");

        loop {
            // 1. Render current state
            self.terminal.draw(|f| render(self.app.state(), f))?;

            // 2. Handle input; Redraw and Idle just loop back to render
            if let Input::Key(key) = self.input.next().await? {
                if self.app.handle_key(key) {
                    break; // Quit requested
                }
            }

            // 3. Process pending actions
            self.process_pending_actions().await?;

            // 4. Check for quit
            if self.app.state().should_quit {
                break;
            }
        }

        info!("TUI main loop ended");
        Ok(())
    }

    /// Process pending actions from user input.
    async fn process_pending_actions(&mut self) -> Result<()> {
        if let Some(action) = self.app.state_mut().pending_action.take() {
            self.app.state_mut().set_status("Working...");
            self.terminal.draw(|f| render(self.app.state(), f))?;
            self.app.state_mut().clear_status();
            self.services.apply(self.app.state_mut(), action).await;
        }
        Ok(())
    }
}
