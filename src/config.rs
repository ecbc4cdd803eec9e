//! Dialog Configuration
//!
//! A `DialogConfiguration` is built once by whoever launches the dialog
//! (options loader, CLI, caller code) and is never mutated after the
//! session takes ownership of it.
//!
//! Configuration can be loaded from:
//! - Default values
//! - A JSON file
//! - A TOML file (`.toml` extension)

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DialogError, Result};
use crate::position::DialogPosition;

/// Which dialog flavour a session runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogKind {
    /// Close running applications before the deployment proceeds
    CloseApps,
    /// Prompt for a computer restart
    Restart,
    /// Free-form buttons plus a text field
    Input {
        #[serde(default)]
        secure: bool,
        #[serde(default)]
        initial_text: String,
    },
    /// Free-form buttons
    Custom,
    /// Non-blocking progress indicator
    Progress,
}

impl DialogKind {
    pub fn label(&self) -> &'static str {
        match self {
            DialogKind::CloseApps => "close_apps",
            DialogKind::Restart => "restart",
            DialogKind::Input { .. } => "input",
            DialogKind::Custom => "custom",
            DialogKind::Progress => "progress",
        }
    }
}

/// Button labels for the three button slots (left, middle, right)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonLabels {
    pub left: Option<String>,
    pub middle: Option<String>,
    pub right: Option<String>,
}

impl ButtonLabels {
    /// True when no slot carries a usable label
    pub fn is_empty(&self) -> bool {
        [&self.left, &self.middle, &self.right]
            .iter()
            .all(|label| label.as_deref().map_or(true, |l| l.trim().is_empty()))
    }
}

/// Text used by the close-apps dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseAppsStrings {
    pub close_button: String,
    pub continue_button: String,
    pub defer_button: String,
    /// Message shown once no blocking applications remain
    pub continue_message: String,
    pub deferrals_remaining: String,
    pub deferral_deadline: String,
    pub countdown: String,
}

impl Default for CloseAppsStrings {
    fn default() -> Self {
        Self {
            close_button: "Close Programs".to_string(),
            continue_button: "Continue".to_string(),
            defer_button: "Defer".to_string(),
            continue_message: "Please click [bold]Continue[/bold] to proceed with the installation."
                .to_string(),
            deferrals_remaining: "Remaining deferrals: {count}".to_string(),
            deferral_deadline: "Deferral deadline: {deadline}".to_string(),
            countdown: "The programs will close automatically in {time}".to_string(),
        }
    }
}

/// Text used by the restart dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartStrings {
    pub restart_now_button: String,
    pub minimize_button: String,
    pub countdown: String,
}

impl Default for RestartStrings {
    fn default() -> Self {
        Self {
            restart_now_button: "Restart Now".to_string(),
            minimize_button: "Minimize".to_string(),
            countdown: "Your computer will restart automatically in {time}".to_string(),
        }
    }
}

/// Immutable per-dialog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfiguration {
    /// Window title
    pub title: String,
    /// Optional line under the title
    pub subtitle: Option<String>,
    /// Message text (inline markup allowed)
    pub message: String,
    /// Labels for the free-form button slots (Input / Custom)
    pub buttons: ButtonLabels,
    /// Countdown duration in seconds (0 or unset = no countdown)
    pub countdown_secs: Option<u64>,
    /// Warning window at the end of the countdown, in seconds
    pub countdown_warning_secs: Option<u64>,
    /// Hard expiry in seconds; closes with `Timeout`
    pub expiry_secs: Option<u64>,
    /// How often to restore the window position, in seconds
    pub persist_interval_secs: Option<u64>,
    /// Deferrals the user still has
    pub deferrals_remaining: Option<u32>,
    /// Last moment a deferral is permitted
    pub deferral_deadline: Option<DateTime<Utc>>,
    /// Countdown expiry must act rather than just run out
    pub forced_countdown: bool,
    /// Continue automatically once all blocking applications exit
    pub continue_on_process_closure: bool,
    /// Initial window position preset
    pub position: DialogPosition,
    /// Whether the user may move the window
    pub allow_move: bool,
    /// Dialog icon (banner/app icon)
    pub icon: Option<PathBuf>,
    pub close_apps: CloseAppsStrings,
    pub restart: RestartStrings,
}

impl Default for DialogConfiguration {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: None,
            message: String::new(),
            buttons: ButtonLabels::default(),
            countdown_secs: None,
            countdown_warning_secs: None,
            expiry_secs: None,
            persist_interval_secs: None,
            deferrals_remaining: None,
            deferral_deadline: None,
            forced_countdown: false,
            continue_on_process_closure: false,
            position: DialogPosition::default(),
            allow_move: true,
            icon: None,
            close_apps: CloseAppsStrings::default(),
            restart: RestartStrings::default(),
        }
    }
}

fn secs(value: Option<u64>) -> Option<Duration> {
    value.filter(|s| *s > 0).map(Duration::from_secs)
}

impl DialogConfiguration {
    /// Load configuration from a JSON or TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        debug!("Loaded dialog configuration from {}", path.display());
        Ok(config)
    }

    pub fn countdown(&self) -> Option<Duration> {
        secs(self.countdown_secs)
    }

    pub fn countdown_warning(&self) -> Option<Duration> {
        secs(self.countdown_warning_secs)
    }

    pub fn expiry(&self) -> Option<Duration> {
        secs(self.expiry_secs)
    }

    pub fn persist_interval(&self) -> Option<Duration> {
        secs(self.persist_interval_secs)
    }

    /// Check the configuration for a given dialog kind.
    ///
    /// Failures here are hard: the dialog never becomes visible.
    pub fn validate(&self, kind: &DialogKind) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(DialogError::MissingText { field: "title" });
        }
        if !matches!(kind, DialogKind::Progress) && self.message.trim().is_empty() {
            return Err(DialogError::MissingText { field: "message" });
        }
        if matches!(kind, DialogKind::Input { .. } | DialogKind::Custom) && self.buttons.is_empty() {
            return Err(DialogError::InvalidConfig(format!(
                "{} dialog needs at least one button label",
                kind.label()
            )));
        }
        if let Some(icon) = &self.icon {
            if !icon.exists() {
                return Err(DialogError::InvalidIcon { path: icon.clone() });
            }
        }
        if let (Some(warning), Some(countdown)) = (self.countdown_warning(), self.countdown()) {
            if warning > countdown {
                return Err(DialogError::InvalidConfig(format!(
                    "countdown warning ({}s) exceeds countdown ({}s)",
                    warning.as_secs(),
                    countdown.as_secs()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base() -> DialogConfiguration {
        DialogConfiguration {
            title: "Contoso Installer".into(),
            message: "Please close the following programs.".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let config = DialogConfiguration {
            title: "   ".into(),
            ..base()
        };
        assert!(matches!(
            config.validate(&DialogKind::CloseApps),
            Err(DialogError::MissingText { field: "title" })
        ));
    }

    #[test]
    fn test_progress_allows_empty_message() {
        let config = DialogConfiguration {
            message: String::new(),
            ..base()
        };
        assert!(config.validate(&DialogKind::Progress).is_ok());
        assert!(config.validate(&DialogKind::Restart).is_err());
    }

    #[test]
    fn test_custom_requires_buttons() {
        let config = base();
        assert!(matches!(
            config.validate(&DialogKind::Custom),
            Err(DialogError::InvalidConfig(_))
        ));

        let config = DialogConfiguration {
            buttons: ButtonLabels {
                right: Some("OK".into()),
                ..Default::default()
            },
            ..base()
        };
        assert!(config.validate(&DialogKind::Custom).is_ok());
    }

    #[test]
    fn test_missing_icon_is_rejected() {
        let config = DialogConfiguration {
            icon: Some(PathBuf::from("/definitely/not/here/app.ico")),
            ..base()
        };
        assert!(matches!(
            config.validate(&DialogKind::CloseApps),
            Err(DialogError::InvalidIcon { .. })
        ));
    }

    #[test]
    fn test_zero_durations_mean_disabled() {
        let config = DialogConfiguration {
            countdown_secs: Some(0),
            expiry_secs: Some(90),
            ..base()
        };
        assert_eq!(config.countdown(), None);
        assert_eq!(config.expiry(), Some(Duration::from_secs(90)));
        assert_eq!(config.persist_interval(), None);
    }

    #[test]
    fn test_warning_longer_than_countdown() {
        let config = DialogConfiguration {
            countdown_secs: Some(30),
            countdown_warning_secs: Some(60),
            ..base()
        };
        assert!(config.validate(&DialogKind::Restart).is_err());
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("dialog.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        writeln!(
            file,
            "title = \"Setup\"\nmessage = \"Hello\"\ncountdown_secs = 60\ndeferrals_remaining = 2\nposition = \"bottom_right\"\n\n[buttons]\nright = \"OK\""
        )
        .unwrap();
        let config = DialogConfiguration::load(&toml_path).unwrap();
        assert_eq!(config.title, "Setup");
        assert_eq!(config.countdown(), Some(Duration::from_secs(60)));
        assert_eq!(config.deferrals_remaining, Some(2));
        assert_eq!(config.position, DialogPosition::BottomRight);
        assert_eq!(config.buttons.right.as_deref(), Some("OK"));
        assert!(config.allow_move);

        let json_path = dir.path().join("dialog.json");
        std::fs::write(
            &json_path,
            r#"{"title":"Setup","message":"Hi","forced_countdown":true,"close_apps":{"defer_button":"Later"}}"#,
        )
        .unwrap();
        let config = DialogConfiguration::load(&json_path).unwrap();
        assert!(config.forced_countdown);
        assert_eq!(config.close_apps.defer_button, "Later");
        assert_eq!(config.close_apps.close_button, "Close Programs");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            DialogConfiguration::load(&path),
            Err(DialogError::Json(_))
        ));
    }
}
