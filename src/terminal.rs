//! Terminal dialog host
//!
//! Draws the dialog to stdout with `console` styling and reads button
//! presses from stdin: `1`, `2`, `3` press the left, middle and right
//! buttons. On input dialogs any other line replaces the field text.

use std::io::BufRead;

use console::{style, Emoji, Term};
use deploy_dialogs::host::DialogHost;
use deploy_dialogs::markup::Run;
use deploy_dialogs::position::{WindowPlacement, WindowPosition, WindowSize, WorkArea};
use deploy_dialogs::view::{ButtonSlot, DialogView};
use deploy_dialogs::{DialogError, DialogHandle, Result};
use tracing::{debug, warn};

static APP: Emoji<'_, '_> = Emoji("▪ ", "* ");
static CLOCK: Emoji<'_, '_> = Emoji("⏱ ", "");
static ARROW: Emoji<'_, '_> = Emoji("→ ", "-> ");

pub struct TerminalHost {
    term: Term,
    /// Last frame without the countdown line
    last_body: Option<String>,
    last_countdown: Option<String>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            last_body: None,
            last_countdown: None,
        }
    }

    fn render_message(runs: &[Run]) -> String {
        runs.iter()
            .map(|run| {
                let ctx = run.style();
                let mut styled = style(run.text().to_string());
                if ctx.bold {
                    styled = styled.bold();
                }
                if ctx.italic {
                    styled = styled.italic();
                }
                if ctx.accent {
                    styled = styled.cyan();
                }
                match run {
                    Run::Link(link) => format!("{} ({})", styled.underlined().blue(), style(&link.target).dim()),
                    Run::Text(_) => styled.to_string(),
                }
            })
            .collect()
    }

    fn render_body(view: &DialogView) -> String {
        let mut out = Vec::new();
        out.push(format!("{}", style(&view.title).bold().underlined()));
        if let Some(subtitle) = &view.subtitle {
            out.push(format!("{}", style(subtitle).dim()));
        }
        out.push(String::new());
        out.push(Self::render_message(&view.message));

        if !view.blocking_apps.is_empty() {
            out.push(String::new());
            for app in &view.blocking_apps {
                out.push(format!("  {}{}", APP, style(&app.description).yellow()));
            }
        }
        for line in &view.deferral_lines {
            out.push(format!("{}", style(line).dim()));
        }
        if let Some(progress) = &view.progress {
            let filled = (progress.percent / 5.0).round() as usize;
            out.push(format!(
                "[{}{}] {:>3.0}%",
                style("#".repeat(filled)).green(),
                " ".repeat(20usize.saturating_sub(filled)),
                progress.percent
            ));
            if let Some(detail) = &progress.detail {
                out.push(format!("{}", style(detail).dim()));
            }
        }
        if let Some(input) = &view.input {
            out.push(format!("{}{}", ARROW, input.display_text));
        }

        let buttons: Vec<String> = view
            .buttons
            .layout()
            .into_iter()
            .map(|cell| {
                let button = view.buttons.get(cell.slot);
                let key = match cell.slot {
                    ButtonSlot::Left => 1,
                    ButtonSlot::Middle => 2,
                    ButtonSlot::Right => 3,
                };
                let label = format!("[{}] {}", key, button.label);
                if button.enabled {
                    style(label).bold().to_string()
                } else {
                    style(label).dim().to_string()
                }
            })
            .collect();
        if !buttons.is_empty() {
            out.push(String::new());
            out.push(buttons.join("   "));
        }
        out.join("\n")
    }

    fn draw(&mut self, view: &DialogView) {
        let body = Self::render_body(view);
        let countdown = view.countdown.as_ref().map(|c| {
            let text = format!("{}{}", CLOCK, c.text);
            if c.in_warning {
                style(text).red().bold().to_string()
            } else {
                text
            }
        });

        if self.last_body.as_deref() != Some(body.as_str()) {
            let _ = self.term.write_line("");
            let _ = self.term.write_line(&body);
            if let Some(countdown) = &countdown {
                let _ = self.term.write_line(countdown);
            }
            self.last_body = Some(body);
        } else if countdown != self.last_countdown {
            if let Some(countdown) = &countdown {
                let _ = self.term.clear_last_lines(1);
                let _ = self.term.write_line(countdown);
            }
        }
        self.last_countdown = countdown;
    }
}

impl DialogHost for TerminalHost {
    fn show(&mut self, view: &DialogView, handle: DialogHandle) -> Result<WindowSize> {
        self.draw(view);

        let input_dialog = view.input.is_some();
        std::thread::Builder::new()
            .name("stdin-clicks".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    let sent = match line.trim() {
                        "1" => handle.click(ButtonSlot::Left),
                        "2" => handle.click(ButtonSlot::Middle),
                        "3" => handle.click(ButtonSlot::Right),
                        _ if input_dialog => handle.set_input_text(line),
                        other => {
                            warn!("Unknown key {:?}, press 1, 2 or 3", other);
                            Ok(())
                        }
                    };
                    if sent.is_err() {
                        break;
                    }
                }
                debug!("Stopped reading stdin");
            })
            .map_err(|e| DialogError::Host(format!("failed to start stdin reader: {}", e)))?;

        let (height, width) = self.term.size();
        Ok(WindowSize {
            width: i32::from(width),
            height: i32::from(height),
        })
    }

    fn refresh(&mut self, view: &DialogView) {
        self.draw(view);
    }

    fn work_area(&self) -> WorkArea {
        let (height, width) = self.term.size();
        WorkArea {
            left: 0,
            top: 0,
            width: i32::from(width),
            height: i32::from(height),
        }
    }

    fn place(&mut self, _position: WindowPosition) {}

    fn restore(&mut self, _placement: WindowPlacement) {
        let _ = self.term.write_line(&style("(dialog restored)").dim().to_string());
        self.last_body = None;
    }

    fn minimize(&mut self) {
        let _ = self.term.write_line(&style("(dialog minimized)").dim().to_string());
        self.last_body = None;
    }

    fn close(&mut self) {
        let _ = self.term.write_line("");
    }
}
