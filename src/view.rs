//! Dialog view model
//!
//! Everything a host needs to draw one frame of a dialog. The session
//! rebuilds it after every state change and hands it to the host.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::icons::Icon;
use crate::markup::Run;

/// Button position in the dialog's button row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonSlot {
    Left,
    Middle,
    Right,
}

impl ButtonSlot {
    pub const ALL: [ButtonSlot; 3] = [ButtonSlot::Left, ButtonSlot::Middle, ButtonSlot::Right];
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub visible: bool,
    pub enabled: bool,
}

impl ButtonView {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn shown(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            visible: true,
            enabled: true,
        }
    }

    /// Visible only when a non-empty label is configured
    pub fn optional(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some(label) if !label.is_empty() => Self::shown(label),
            _ => Self::hidden(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// A button's cell in the row grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonCell {
    pub slot: ButtonSlot,
    pub column: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonRow {
    pub left: ButtonView,
    pub middle: ButtonView,
    pub right: ButtonView,
}

impl ButtonRow {
    pub fn get(&self, slot: ButtonSlot) -> &ButtonView {
        match slot {
            ButtonSlot::Left => &self.left,
            ButtonSlot::Middle => &self.middle,
            ButtonSlot::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, slot: ButtonSlot) -> &mut ButtonView {
        match slot {
            ButtonSlot::Left => &mut self.left,
            ButtonSlot::Middle => &mut self.middle,
            ButtonSlot::Right => &mut self.right,
        }
    }

    /// Visible buttons, left to right, each in its own equal-width column
    pub fn layout(&self) -> Vec<ButtonCell> {
        ButtonSlot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).visible)
            .enumerate()
            .map(|(column, slot)| ButtonCell { slot, column })
            .collect()
    }

    pub fn column_count(&self) -> usize {
        self.layout().len()
    }

    /// Right-most visible button
    pub fn rightmost_visible(&self) -> Option<ButtonSlot> {
        self.layout().last().map(|cell| cell.slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownView {
    pub remaining: Duration,
    /// Caption including the formatted remaining time
    pub text: String,
    pub in_warning: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub name: String,
    pub description: String,
    pub icon: Arc<Icon>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub detail: Option<String>,
    /// Displayed (animated) percentage, 0-100
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFieldView {
    pub secure: bool,
    /// Current text; masked for secure fields
    pub display_text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogView {
    pub title: String,
    pub subtitle: Option<String>,
    pub icon: Option<Arc<Icon>>,
    pub message: Vec<Run>,
    pub buttons: ButtonRow,
    pub countdown: Option<CountdownView>,
    pub deferral_lines: Vec<String>,
    pub blocking_apps: Vec<AppEntry>,
    pub progress: Option<ProgressView>,
    pub input: Option<InputFieldView>,
}

impl DialogView {
    /// Drop references to cached icons
    pub fn release_resources(&mut self) {
        self.icon = None;
        self.blocking_apps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_skips_hidden_buttons() {
        let row = ButtonRow {
            left: ButtonView::shown("Close Programs"),
            middle: ButtonView::hidden(),
            right: ButtonView::shown("Defer").enabled(false),
        };
        assert_eq!(
            row.layout(),
            vec![
                ButtonCell {
                    slot: ButtonSlot::Left,
                    column: 0
                },
                ButtonCell {
                    slot: ButtonSlot::Right,
                    column: 1
                },
            ]
        );
        assert_eq!(row.rightmost_visible(), Some(ButtonSlot::Right));
        assert!(!row.right.is_clickable());
    }

    #[test]
    fn test_optional_labels() {
        assert!(!ButtonView::optional(None).visible);
        assert!(!ButtonView::optional(Some("  ")).visible);
        let ok = ButtonView::optional(Some("OK"));
        assert!(ok.visible && ok.enabled);
        assert_eq!(ButtonRow::default().column_count(), 0);
    }
}
