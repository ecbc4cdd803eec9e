//! Deployment Dialogs Library
//!
//! Dialog lifecycle engine for software deployment prompts: close running
//! applications, restart, text input, custom buttons and progress.

pub mod config;
pub mod countdown;
pub mod deferral;
pub mod error;
pub mod host;
pub mod icons;
pub mod markup;
pub mod monitor;
pub mod outcome;
pub mod position;
pub mod progress;
pub mod session;
pub mod timers;
pub mod view;

pub use config::{ButtonLabels, DialogConfiguration, DialogKind};
pub use error::{DialogError, Result};
pub use host::{CommandRestart, DialogHost, HeadlessHost, LoggingRestart, RestartPrimitive};
pub use icons::{FileIconLoader, Icon, IconCache, IconLoader};
pub use markup::{MarkupRenderer, Run};
pub use monitor::{BlockingApplication, BlockingApplicationSet, ProcessMonitor, ProcessMonitorFeed};
pub use outcome::{DialogOutcome, DialogResult, InputValue};
pub use position::DialogPosition;
pub use session::{Collaborators, DialogHandle, DialogSession, SessionState};
pub use view::{ButtonSlot, DialogView};
