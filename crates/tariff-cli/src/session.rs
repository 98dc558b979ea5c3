//! Scripted keystroke sessions.
//!
//! A session is a list of keys replayed against a [`Navigator`] on a virtual
//! clock, so debounce behaves exactly as it would for a person typing at a
//! steady pace without the command actually sleeping.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use tariff_navigator::{EventOutcome, Navigator, NavigatorEvent, ResponseOutcome};
use tracing::debug;

/// Virtual time between two typed characters.
pub const KEY_INTERVAL: Duration = Duration::from_millis(50);

/// One scripted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Type each character of the text, one keystroke at a time.
    Type(String),
    /// Delete the last character of the query.
    Backspace,
    Down,
    Up,
    Right,
    Left,
    Enter,
    Esc,
    /// Click the row at the index.
    Click(usize),
    /// Click outside the widget.
    Outside,
    /// Let virtual time pass.
    Wait(Duration),
}

impl FromStr for Key {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(text) = raw.strip_prefix("type:") {
            return Ok(Self::Type(text.to_string()));
        }
        if let Some(ms) = raw.strip_prefix("wait:") {
            let ms = ms
                .parse::<u64>()
                .map_err(|e| format!("invalid wait {ms:?}: {e}"))?;
            return Ok(Self::Wait(Duration::from_millis(ms)));
        }
        if let Some(index) = raw.strip_prefix("click:") {
            let index = index
                .parse::<usize>()
                .map_err(|e| format!("invalid row {index:?}: {e}"))?;
            return Ok(Self::Click(index));
        }
        match raw.to_ascii_lowercase().as_str() {
            "down" => Ok(Self::Down),
            "up" => Ok(Self::Up),
            "right" => Ok(Self::Right),
            "left" => Ok(Self::Left),
            "enter" => Ok(Self::Enter),
            "esc" | "escape" => Ok(Self::Esc),
            "back" | "backspace" => Ok(Self::Backspace),
            "outside" => Ok(Self::Outside),
            other => Err(format!(
                "unknown key {other:?} (expected type:TEXT, wait:MS, click:N, down, up, \
                 right, left, enter, esc, back or outside)"
            )),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(text) => write!(f, "type:{text}"),
            Self::Backspace => f.write_str("back"),
            Self::Down => f.write_str("down"),
            Self::Up => f.write_str("up"),
            Self::Right => f.write_str("right"),
            Self::Left => f.write_str("left"),
            Self::Enter => f.write_str("enter"),
            Self::Esc => f.write_str("esc"),
            Self::Click(index) => write!(f, "click:{index}"),
            Self::Outside => f.write_str("outside"),
            Self::Wait(duration) => write!(f, "wait:{}", duration.as_millis()),
        }
    }
}

/// What happened during a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Committed codes, in order.
    pub committed: Vec<String>,
    /// Search responses applied to the view.
    pub searches_applied: usize,
    /// Search responses dropped as stale.
    pub searches_stale: usize,
}

/// Replay `keys`, then let any pending search settle.
pub async fn replay(navigator: &mut Navigator, keys: &[Key]) -> SessionReport {
    let mut session = Session {
        navigator,
        clock: Instant::now(),
        report: SessionReport::default(),
    };
    for key in keys {
        debug!(%key, "replaying key");
        session.press(key).await;
    }
    session.settle().await;
    session.report
}

struct Session<'a> {
    navigator: &'a mut Navigator,
    clock: Instant,
    report: SessionReport,
}

impl Session<'_> {
    async fn press(&mut self, key: &Key) {
        match key {
            Key::Type(text) => {
                let mut query = self.navigator.view().query;
                for ch in text.chars() {
                    query.push(ch);
                    self.send(NavigatorEvent::Input(query.clone())).await;
                    self.advance(KEY_INTERVAL).await;
                }
            }
            Key::Backspace => {
                let mut query = self.navigator.view().query;
                query.pop();
                self.send(NavigatorEvent::Input(query)).await;
                self.advance(KEY_INTERVAL).await;
            }
            Key::Wait(duration) => self.advance(*duration).await,
            Key::Down => self.send(NavigatorEvent::ArrowDown).await,
            Key::Up => self.send(NavigatorEvent::ArrowUp).await,
            Key::Right => self.send(NavigatorEvent::ArrowRight).await,
            Key::Left => self.send(NavigatorEvent::ArrowLeft).await,
            Key::Enter => self.send(NavigatorEvent::Enter).await,
            Key::Esc => self.send(NavigatorEvent::Escape).await,
            Key::Click(index) => self.send(NavigatorEvent::ClickRow(*index)).await,
            Key::Outside => self.send(NavigatorEvent::ClickOutside).await,
        }
    }

    async fn send(&mut self, event: NavigatorEvent) {
        let skips_focus = matches!(
            event,
            NavigatorEvent::Escape | NavigatorEvent::ClickOutside | NavigatorEvent::Input(_)
        );
        if !self.navigator.mode().is_open() && !skips_focus {
            // Navigation keys on a closed widget focus it first
            self.navigator.handle(NavigatorEvent::Focus, self.clock).await;
        }
        if let EventOutcome::Committed(code) = self.navigator.handle(event, self.clock).await {
            self.report.committed.push(code);
        }
    }

    /// Move the virtual clock forward, running every search that falls due.
    async fn advance(&mut self, by: Duration) {
        let target = self.clock + by;
        while let Some(deadline) = self.navigator.next_deadline().filter(|d| *d <= target) {
            self.clock = self.clock.max(deadline);
            self.tick().await;
        }
        self.clock = target;
    }

    async fn settle(&mut self) {
        if let Some(deadline) = self.navigator.next_deadline() {
            self.clock = self.clock.max(deadline);
            self.tick().await;
        }
    }

    async fn tick(&mut self) {
        match self.navigator.tick(self.clock).await {
            Some(ResponseOutcome::Applied) => self.report.searches_applied += 1,
            Some(ResponseOutcome::Stale) => self.report.searches_stale += 1,
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        assert_eq!("type:mob".parse::<Key>(), Ok(Key::Type("mob".into())));
        assert_eq!("type:".parse::<Key>(), Ok(Key::Type(String::new())));
        assert_eq!("wait:300".parse::<Key>(), Ok(Key::Wait(Duration::from_millis(300))));
        assert_eq!("click:2".parse::<Key>(), Ok(Key::Click(2)));
        assert_eq!("Enter".parse::<Key>(), Ok(Key::Enter));
        assert_eq!("escape".parse::<Key>(), Ok(Key::Esc));
        assert!("wait:soon".parse::<Key>().is_err());
        assert!("jump".parse::<Key>().unwrap_err().contains("unknown key"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for raw in ["type:8517", "wait:120", "click:0", "down", "esc", "back"] {
            let key: Key = raw.parse().unwrap();
            assert_eq!(key.to_string(), raw);
        }
    }
}
