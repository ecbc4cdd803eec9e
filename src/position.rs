//! Window position presets
//!
//! Maps a `DialogPosition` preset onto concrete window coordinates inside the
//! current screen working area. Actual placement is left to the host.

use serde::{Deserialize, Serialize};

/// Where the dialog should appear on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogPosition {
    #[default]
    Center,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Usable screen area (excludes taskbars/panels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkArea {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl WorkArea {
    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPosition {
    pub left: i32,
    pub top: i32,
}

/// Last recorded normal position and size of a dialog window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlacement {
    pub position: WindowPosition,
    pub size: WindowSize,
}

impl DialogPosition {
    /// Compute the top-left corner for a window of `size` inside `area`.
    ///
    /// Windows larger than the work area are pinned to its top-left edge.
    pub fn locate(self, area: WorkArea, size: WindowSize) -> WindowPosition {
        let free_x = (area.width - size.width).max(0);
        let free_y = (area.height - size.height).max(0);

        let center_x = area.left + free_x / 2;
        let center_y = area.top + free_y / 2;
        let right = area.left + free_x;
        let bottom = area.top + free_y;

        let (left, top) = match self {
            DialogPosition::Center => (center_x, center_y),
            DialogPosition::Top => (center_x, area.top),
            DialogPosition::Bottom => (center_x, bottom),
            DialogPosition::TopLeft => (area.left, area.top),
            DialogPosition::TopRight => (right, area.top),
            DialogPosition::BottomLeft => (area.left, bottom),
            DialogPosition::BottomRight => (right, bottom),
        };
        WindowPosition { left, top }
    }
}
