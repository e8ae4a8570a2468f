//! Terminal User Interface for hdb-advisor.
//!
//! A login screen followed by a sidebar with one entry per page:
//! - **Main**: disclaimer, buying steps and FAQ
//! - **Affordability Calculator**: form, estimate and optional advice
//! - **General Query on HDB**: question box, answer and price-trend chart
//! - **About Us** / **Methodology**: static text

mod app;
mod events;
mod input;
mod runner;
mod state;
mod views;

pub use app::App;
pub use events::{Input, InputSource};
pub use input::{KeyEvent, TextInput};
pub use runner::{Services, TuiRunner};
pub use state::{AppState, Focus, PendingAction};

use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use eyre::Result;
use ratatui::prelude::*;
use std::io::{Stdout, stdout};

/// Type alias for our terminal backend.
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode.
///
/// Enables raw mode and switches to the alternate screen.
pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
///
/// Disables raw mode and leaves the alternate screen.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the TUI until the user quits. The terminal is restored even when the
/// loop fails.
pub async fn run(services: Services) -> Result<()> {
    let terminal = init_terminal()?;
    let mut runner = TuiRunner::new(terminal, services);
    let result = runner.run().await;
    restore_terminal()?;
    result
}

/// Palette for the TUI.
pub mod colors {
    use ratatui::style::Color;

    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const FOCUS: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const SELECTED: Color = Color::Rgb(255, 215, 0); // Gold
    pub const SUCCESS: Color = Color::Rgb(50, 205, 50); // Lime green
    pub const WARNING: Color = Color::Rgb(255, 165, 0); // Orange
    pub const ERROR: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const STATUS: Color = Color::Rgb(255, 255, 0); // Yellow
    pub const DIM: Color = Color::DarkGray;
}
