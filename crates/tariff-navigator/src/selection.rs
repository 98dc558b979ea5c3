//! Selection state machine for the lookup combobox.
//!
//! ```text
//!            Focus / Input                Input (query >= threshold)
//!  Closed ─────────────────▶ Browsing ◀─────────────────────────▶ Searching
//!    ▲                          │      Input (query < threshold)      │
//!    └──── Escape / ClickOutside / Commit ────────────────────────────┘
//! ```
//!
//! The machine tracks only the mode and the highlighted row. The rows
//! themselves are derived elsewhere and passed in as a length.

use crate::query::QueryMode;

/// Visible state of the lookup widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetMode {
    #[default]
    Closed,
    Browsing,
    Searching,
}

impl WidgetMode {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl From<QueryMode> for WidgetMode {
    fn from(mode: QueryMode) -> Self {
        match mode {
            QueryMode::Browse => Self::Browsing,
            QueryMode::Search => Self::Searching,
        }
    }
}

/// Input delivered to the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorEvent {
    /// The lookup input gained focus.
    Focus,
    /// The input text changed to the given value.
    Input(String),
    ArrowDown,
    ArrowUp,
    /// Expand the highlighted tree row.
    ArrowRight,
    /// Collapse the highlighted tree row, or move to its parent.
    ArrowLeft,
    Enter,
    Escape,
    /// A click landed outside the widget.
    ClickOutside,
    /// A row was clicked.
    ClickRow(usize),
}

/// Mode plus highlighted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionMachine {
    mode: WidgetMode,
    highlighted: Option<usize>,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> WidgetMode {
        self.mode
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Closed -> Browsing with nothing highlighted. Returns false if already open.
    pub fn open(&mut self) -> bool {
        if self.mode.is_open() {
            return false;
        }
        self.mode = WidgetMode::Browsing;
        self.highlighted = None;
        true
    }

    /// Follow the query mode while open.
    pub fn set_query_mode(&mut self, mode: QueryMode) {
        if self.mode.is_open() {
            self.mode = mode.into();
        }
    }

    /// The visible list was replaced; nothing is highlighted any more.
    pub fn reset_highlight(&mut self) {
        self.highlighted = None;
    }

    /// Highlight the given row, if it exists.
    pub fn highlight(&mut self, index: usize, len: usize) {
        if index < len {
            self.highlighted = Some(index);
        }
    }

    /// Move down one row, stopping at the last row.
    pub fn move_down(&mut self, len: usize) {
        if !self.mode.is_open() || len == 0 {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            None => 0,
            Some(index) => (index + 1).min(len - 1),
        });
    }

    /// Move up one row, stopping at the first row.
    pub fn move_up(&mut self, len: usize) {
        if !self.mode.is_open() || len == 0 {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            None => 0,
            Some(index) => index.saturating_sub(1).min(len - 1),
        });
    }

    /// Keep the highlight inside a list that shrank.
    pub fn clamp(&mut self, len: usize) {
        self.highlighted = match self.highlighted {
            _ if len == 0 => None,
            Some(index) => Some(index.min(len - 1)),
            None => None,
        };
    }

    /// Row to commit on Enter, if any.
    pub fn commit_target(&self, len: usize) -> Option<usize> {
        if !self.mode.is_open() {
            return None;
        }
        self.highlighted.filter(|&index| index < len)
    }

    pub fn close(&mut self) {
        self.mode = WidgetMode::Closed;
        self.highlighted = None;
    }
}
