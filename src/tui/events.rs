//! Terminal input for the TUI loop.
//!
//! `InputSource` waits on crossterm off the async runtime and hands the
//! runner an `Input`: a key press in the app's own `KeyEvent`, a redraw
//! request, or `Idle` when the poll interval lapsed with nothing to do.

use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
use eyre::Result;
use std::time::Duration;

use super::input::KeyEvent;

/// Floor for the poll interval; a zero interval would spin the blocking pool.
const MIN_POLL_MS: u64 = 10;

/// What the runner reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Key(KeyEvent),
    /// The terminal changed size or regained focus
    Redraw,
    Idle,
}

/// Map a raw terminal event onto `Input`.
///
/// Key releases and repeats are dropped so that a held key types once per
/// press on terminals that report them. Mouse and paste events are ignored.
pub fn translate(raw: CrosstermEvent) -> Option<Input> {
    match raw {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Input::Key(key.into())),
        CrosstermEvent::Resize(_, _) | CrosstermEvent::FocusGained => Some(Input::Redraw),
        _ => None,
    }
}

pub struct InputSource {
    poll_interval: Duration,
}

impl InputSource {
    pub fn new(poll_interval_ms: u64) -> Self {
        Self {
            poll_interval: Duration::from_millis(poll_interval_ms.max(MIN_POLL_MS)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait up to one poll interval for input.
    pub async fn next(&self) -> Result<Input> {
        let interval = self.poll_interval;
        let input = tokio::task::spawn_blocking(move || -> Result<Input> {
            if !event::poll(interval)? {
                return Ok(Input::Idle);
            }
            Ok(translate(event::read()?).unwrap_or(Input::Idle))
        })
        .await??;
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers, MouseEvent, MouseEventKind};

    fn raw_key(code: KeyCode, kind: KeyEventKind) -> CrosstermEvent {
        CrosstermEvent::Key(crossterm::event::KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_key_press_becomes_app_key() {
        let input = translate(raw_key(KeyCode::Char('b'), KeyEventKind::Press));
        assert_eq!(
            input,
            Some(Input::Key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::NONE)))
        );
    }

    #[test]
    fn test_release_and_repeat_are_dropped() {
        assert_eq!(translate(raw_key(KeyCode::Enter, KeyEventKind::Release)), None);
        assert_eq!(translate(raw_key(KeyCode::Enter, KeyEventKind::Repeat)), None);
    }

    #[test]
    fn test_resize_and_focus_request_redraw() {
        assert_eq!(translate(CrosstermEvent::Resize(120, 40)), Some(Input::Redraw));
        assert_eq!(translate(CrosstermEvent::FocusGained), Some(Input::Redraw));
        assert_eq!(translate(CrosstermEvent::FocusLost), None);
    }

    #[test]
    fn test_mouse_is_ignored() {
        let click = CrosstermEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(translate(click), None);
    }

    #[test]
    fn test_poll_interval_floor() {
        assert_eq!(InputSource::new(250).poll_interval(), Duration::from_millis(250));
        assert_eq!(InputSource::new(0).poll_interval(), Duration::from_millis(MIN_POLL_MS));
    }
}
