//! TUI Application
//!
//! Turns key presses into state changes and pending actions. Nothing here
//! blocks; slow work (password hashing, queries, LLM calls) is queued as a
//! `PendingAction` for the runner.

use super::input::KeyEvent;
use super::state::{AppState, Focus, PendingAction};
use crate::content::Page;

/// Main TUI application
#[derive(Debug, Default)]
pub struct App {
    state: AppState,
}

impl App {
    /// Create a new application
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state (used when the login gate is disabled).
    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Request to quit
    pub fn quit(&mut self) {
        self.state.should_quit = true;
    }

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: impl Into<KeyEvent>) -> bool {
        let key = key.into();

        if key.is_interrupt() || (key.is_quit() && !self.state.is_typing()) {
            self.quit();
            return true;
        }

        if !self.state.session.authenticated {
            self.handle_login_key(&key);
            return false;
        }

        if key.is_tab() {
            self.state.focus = self.state.focus.toggle();
            return false;
        }

        match self.state.focus {
            Focus::Sidebar => self.handle_sidebar_key(&key),
            Focus::Content => {
                if key.is_escape() {
                    self.state.focus = Focus::Sidebar;
                    return false;
                }
                match self.state.page {
                    Page::Affordability => self.handle_afford_key(&key),
                    Page::GeneralQuery => self.handle_query_key(&key),
                    Page::Main | Page::AboutUs | Page::Methodology => self.handle_scroll_key(&key),
                }
            }
        }
        false
    }

    fn handle_login_key(&mut self, key: &KeyEvent) {
        let login = &mut self.state.login;
        if key.is_enter() {
            let password = login.password.take();
            self.state.pending_action = Some(PendingAction::Login(password));
        } else if key.is_escape() {
            login.password.clear();
        } else if login.password.handle_key(key) {
            login.error = None;
        }
    }

    fn handle_sidebar_key(&mut self, key: &KeyEvent) {
        if key.is_up() {
            self.state.select_page(self.state.page.prev());
        } else if key.is_down() {
            self.state.select_page(self.state.page.next());
        } else if key.is_enter() || key.is_right() {
            self.state.focus = Focus::Content;
        }
    }

    fn handle_scroll_key(&mut self, key: &KeyEvent) {
        if key.is_up() {
            self.state.scroll = self.state.scroll.saturating_sub(1);
        } else if key.is_down() {
            self.state.scroll = self.state.scroll.saturating_add(1);
        }
    }

    fn handle_query_key(&mut self, key: &KeyEvent) {
        let query = &mut self.state.query;
        if key.is_enter() {
            let text = query.input.content().trim().to_string();
            self.state.pending_action = Some(PendingAction::SubmitQuery(text));
        } else if key.is_up() {
            query.scroll = query.scroll.saturating_sub(1);
        } else if key.is_down() {
            query.scroll = query.scroll.saturating_add(1);
        } else {
            query.input.handle_key(key);
        }
    }

    fn handle_afford_key(&mut self, key: &KeyEvent) {
        let form = &mut self.state.afford;
        if key.is_up() {
            form.select_prev();
        } else if key.is_down() {
            form.select_next();
        } else if key.is_enter() {
            match form.parse() {
                Ok(input) => {
                    let advice = form.want_advice;
                    self.state.pending_action = Some(PendingAction::Calculate { input, advice });
                }
                Err(message) => {
                    form.clear_output();
                    form.error = Some(message);
                }
            }
        } else if form.on_toggle() {
            if key.char() == Some(' ') {
                form.want_advice = !form.want_advice;
            }
        } else if let Some(field) = form.selected_field() {
            field.handle_key(key);
        }
    }
}
