//! Formatting contexts
//!
//! Each open style tag pushes a copy of the current context with one more
//! flag set, so nesting is cumulative. Closing tags pop only when they match
//! the frame on top.

use serde::{Deserialize, Serialize};

/// Style flag toggled by a paired markup tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleFlag {
    Bold,
    Italic,
    Accent,
}

impl StyleFlag {
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("bold") {
            Some(StyleFlag::Bold)
        } else if tag.eq_ignore_ascii_case("italic") {
            Some(StyleFlag::Italic)
        } else if tag.eq_ignore_ascii_case("accent") {
            Some(StyleFlag::Accent)
        } else {
            None
        }
    }
}

/// Cumulative style applied to a text run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormattingContext {
    pub bold: bool,
    pub italic: bool,
    pub accent: bool,
}

impl FormattingContext {
    pub const PLAIN: FormattingContext = FormattingContext {
        bold: false,
        italic: false,
        accent: false,
    };

    /// Copy of this context with `flag` set
    pub fn with(mut self, flag: StyleFlag) -> Self {
        match flag {
            StyleFlag::Bold => self.bold = true,
            StyleFlag::Italic => self.italic = true,
            StyleFlag::Accent => self.accent = true,
        }
        self
    }

    pub fn has(&self, flag: StyleFlag) -> bool {
        match flag {
            StyleFlag::Bold => self.bold,
            StyleFlag::Italic => self.italic,
            StyleFlag::Accent => self.accent,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }

    /// Heavy font weight. Accent implies bold, applied once.
    pub fn is_heavy(&self) -> bool {
        self.bold || self.accent
    }
}

/// Stack of open formatting frames for one render pass
#[derive(Debug, Default)]
pub struct FormattingContextStack {
    frames: Vec<(StyleFlag, FormattingContext)>,
}

impl FormattingContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context in effect right now (plain when nothing is open)
    pub fn current(&self) -> FormattingContext {
        self.frames
            .last()
            .map(|(_, ctx)| *ctx)
            .unwrap_or_default()
    }

    pub fn push(&mut self, flag: StyleFlag) {
        let next = self.current().with(flag);
        self.frames.push((flag, next));
    }

    /// Pop the top frame if it was opened by `flag`.
    ///
    /// Returns false (and leaves the stack alone) otherwise.
    pub fn pop(&mut self, flag: StyleFlag) -> bool {
        match self.frames.last() {
            Some((top, _)) if *top == flag => {
                self.frames.pop();
                true
            }
            _ => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
