//! External collaborators: window host and OS restart
//!
//! The session never draws or places windows itself. A `DialogHost` owns the
//! actual window (native, console, or nothing at all) and reports user input
//! back through the `DialogHandle` it receives in `show`.

use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::{DialogError, Result};
use crate::position::{WindowPlacement, WindowPosition, WindowSize, WorkArea};
use crate::session::DialogHandle;
use crate::view::DialogView;

/// Window chrome owned by the UI layer
pub trait DialogHost: Send {
    /// Make the window visible for the first time and return its size.
    fn show(&mut self, view: &DialogView, handle: DialogHandle) -> Result<WindowSize>;

    /// Redraw with a new view
    fn refresh(&mut self, view: &DialogView);

    /// Working area of the screen the window is on
    fn work_area(&self) -> WorkArea;

    /// Move the window
    fn place(&mut self, position: WindowPosition);

    /// Un-minimize and return to the given placement
    fn restore(&mut self, placement: WindowPlacement);

    fn minimize(&mut self);

    /// Destroy the window
    fn close(&mut self);
}

/// "Restart the computer now"
pub trait RestartPrimitive: Send + Sync {
    fn restart_now(&self) -> Result<()>;
}

/// Restart primitive that only logs; used for dry runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRestart;

impl RestartPrimitive for LoggingRestart {
    fn restart_now(&self) -> Result<()> {
        info!("Restart requested (dry run, not restarting)");
        Ok(())
    }
}

/// Restarts through the platform `shutdown` command
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRestart;

impl RestartPrimitive for CommandRestart {
    fn restart_now(&self) -> Result<()> {
        let mut command = if cfg!(target_os = "windows") {
            let mut c = Command::new("shutdown");
            c.args(["/r", "/t", "0"]);
            c
        } else {
            let mut c = Command::new("shutdown");
            c.args(["-r", "now"]);
            c
        };

        info!("Restarting computer");
        let status = command
            .status()
            .map_err(|e| DialogError::Restart(format!("failed to run shutdown: {}", e)))?;
        if !status.success() {
            return Err(DialogError::Restart(format!("shutdown exited with {}", status)));
        }
        Ok(())
    }
}

/// Host without any window. Useful for unattended runs where only timers
/// and `CloseDialog` can end the session.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    work_area: WorkArea,
    size: WindowSize,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self {
            work_area: WorkArea {
                left: 0,
                top: 0,
                width: 1920,
                height: 1080,
            },
            size: WindowSize {
                width: 460,
                height: 320,
            },
        }
    }
}

impl DialogHost for HeadlessHost {
    fn show(&mut self, view: &DialogView, _handle: DialogHandle) -> Result<WindowSize> {
        debug!("Headless dialog shown: {}", view.title);
        Ok(self.size)
    }

    fn refresh(&mut self, _view: &DialogView) {}

    fn work_area(&self) -> WorkArea {
        self.work_area
    }

    fn place(&mut self, position: WindowPosition) {
        debug!("Headless dialog placed at {},{}", position.left, position.top);
    }

    fn restore(&mut self, _placement: WindowPlacement) {}

    fn minimize(&mut self) {
        warn!("Headless dialog cannot be minimized");
    }

    fn close(&mut self) {
        debug!("Headless dialog closed");
    }
}
