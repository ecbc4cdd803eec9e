//! Per-variant dialog behavior
//!
//! One session state machine runs every dialog; what differs between close
//! apps, restart, input, custom and progress dialogs is captured here as a
//! small strategy object chosen at construction.

use chrono::{DateTime, Utc};

use crate::config::{DialogConfiguration, DialogKind};
use crate::deferral::DeferralPolicy;
use crate::monitor::BlockingApplicationSet;
use crate::outcome::{DialogOutcome, InputValue};
use crate::view::{ButtonRow, ButtonSlot, ButtonView};

/// Read-only snapshot of session state handed to a behavior
pub struct VariantContext<'a> {
    pub config: &'a DialogConfiguration,
    /// Current message markup (progress updates can replace it)
    pub message: &'a str,
    pub deferral: &'a DeferralPolicy,
    pub blocking: &'a BlockingApplicationSet,
    pub input: Option<&'a InputValue>,
    pub in_warning: bool,
    pub now: DateTime<Utc>,
}

impl VariantContext<'_> {
    pub fn blocking_present(&self) -> bool {
        !self.blocking.is_empty()
    }
}

/// What a button click does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Close the dialog with this outcome
    Finish(DialogOutcome),
    /// Minimize and keep running
    Minimize,
    Ignore,
}

/// Work done before the dialog closes with a given outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    RestartComputer,
}

pub trait VariantBehavior: Send {
    fn name(&self) -> &'static str;

    fn buttons(&self, ctx: &VariantContext<'_>) -> ButtonRow;

    /// Button that `continue_on_process_closure` presses
    fn primary_slot(&self, buttons: &ButtonRow) -> Option<ButtonSlot> {
        buttons.rightmost_visible()
    }

    fn resolve_button(&self, slot: ButtonSlot, buttons: &ButtonRow, ctx: &VariantContext<'_>) -> ButtonAction;

    fn on_countdown_expired(&self, _ctx: &VariantContext<'_>) -> DialogOutcome {
        DialogOutcome::Timeout
    }

    fn side_effect(&self, _outcome: &DialogOutcome) -> Option<SideEffect> {
        None
    }

    /// Restore the window when the countdown enters its warning window
    fn restore_on_warning(&self) -> bool {
        false
    }

    fn message(&self, ctx: &VariantContext<'_>) -> String {
        ctx.message.to_string()
    }

    /// Countdown caption with a `{time}` placeholder
    fn countdown_caption<'c>(&self, _ctx: &VariantContext<'c>) -> Option<&'c str> {
        None
    }

    fn deferral_lines(&self, _ctx: &VariantContext<'_>) -> Vec<String> {
        Vec::new()
    }
}

pub fn behavior_for(kind: &DialogKind) -> Box<dyn VariantBehavior> {
    match kind {
        DialogKind::CloseApps => Box::new(CloseApps),
        DialogKind::Restart => Box::new(Restart),
        DialogKind::Input { .. } => Box::new(Input),
        DialogKind::Custom => Box::new(Custom),
        DialogKind::Progress => Box::new(Progress),
    }
}

fn free_form_buttons(ctx: &VariantContext<'_>) -> ButtonRow {
    let labels = &ctx.config.buttons;
    ButtonRow {
        left: ButtonView::optional(labels.left.as_deref()),
        middle: ButtonView::optional(labels.middle.as_deref()),
        right: ButtonView::optional(labels.right.as_deref()),
    }
}

/// Close running applications / defer
pub struct CloseApps;

impl VariantBehavior for CloseApps {
    fn name(&self) -> &'static str {
        "close_apps"
    }

    fn buttons(&self, ctx: &VariantContext<'_>) -> ButtonRow {
        let strings = &ctx.config.close_apps;
        let primary = if ctx.blocking_present() {
            &strings.close_button
        } else {
            &strings.continue_button
        };
        let defer = if ctx.deferral.is_configured() {
            ButtonView::shown(&strings.defer_button).enabled(ctx.deferral.defer_enabled(ctx.now))
        } else {
            ButtonView::hidden()
        };
        ButtonRow {
            left: ButtonView::shown(primary),
            middle: ButtonView::hidden(),
            right: defer,
        }
    }

    fn primary_slot(&self, _buttons: &ButtonRow) -> Option<ButtonSlot> {
        Some(ButtonSlot::Left)
    }

    fn resolve_button(&self, slot: ButtonSlot, _buttons: &ButtonRow, ctx: &VariantContext<'_>) -> ButtonAction {
        match slot {
            ButtonSlot::Left => ButtonAction::Finish(DeferralPolicy::primary_outcome(ctx.blocking_present())),
            ButtonSlot::Right if ctx.deferral.defer_enabled(ctx.now) => ButtonAction::Finish(DialogOutcome::Defer),
            ButtonSlot::Right | ButtonSlot::Middle => ButtonAction::Ignore,
        }
    }

    fn on_countdown_expired(&self, ctx: &VariantContext<'_>) -> DialogOutcome {
        ctx.deferral.resolve_countdown(ctx.blocking_present(), ctx.now)
    }

    fn message(&self, ctx: &VariantContext<'_>) -> String {
        if ctx.blocking_present() {
            ctx.message.to_string()
        } else {
            format!("{}\n\n{}", ctx.message, ctx.config.close_apps.continue_message)
        }
    }

    fn countdown_caption<'c>(&self, ctx: &VariantContext<'c>) -> Option<&'c str> {
        Some(ctx.config.close_apps.countdown.as_str())
    }

    fn deferral_lines(&self, ctx: &VariantContext<'_>) -> Vec<String> {
        let strings = &ctx.config.close_apps;
        let mut lines = Vec::new();
        if let Some(count) = ctx.deferral.remaining_count {
            lines.push(strings.deferrals_remaining.replace("{count}", &count.to_string()));
        }
        if let Some(deadline) = ctx.deferral.deadline {
            let local = deadline.with_timezone(&chrono::Local);
            lines.push(
                strings
                    .deferral_deadline
                    .replace("{deadline}", &local.format("%Y-%m-%d %H:%M").to_string()),
            );
        }
        lines
    }
}

/// Restart now / minimize
pub struct Restart;

impl VariantBehavior for Restart {
    fn name(&self) -> &'static str {
        "restart"
    }

    fn buttons(&self, ctx: &VariantContext<'_>) -> ButtonRow {
        let strings = &ctx.config.restart;
        ButtonRow {
            left: ButtonView::shown(&strings.minimize_button).enabled(!ctx.in_warning),
            middle: ButtonView::hidden(),
            right: ButtonView::shown(&strings.restart_now_button),
        }
    }

    fn primary_slot(&self, _buttons: &ButtonRow) -> Option<ButtonSlot> {
        Some(ButtonSlot::Right)
    }

    fn resolve_button(&self, slot: ButtonSlot, _buttons: &ButtonRow, _ctx: &VariantContext<'_>) -> ButtonAction {
        match slot {
            ButtonSlot::Left => ButtonAction::Minimize,
            ButtonSlot::Right => ButtonAction::Finish(DialogOutcome::Restart),
            ButtonSlot::Middle => ButtonAction::Ignore,
        }
    }

    fn on_countdown_expired(&self, _ctx: &VariantContext<'_>) -> DialogOutcome {
        DialogOutcome::Restart
    }

    fn side_effect(&self, outcome: &DialogOutcome) -> Option<SideEffect> {
        (*outcome == DialogOutcome::Restart).then_some(SideEffect::RestartComputer)
    }

    fn restore_on_warning(&self) -> bool {
        true
    }

    fn countdown_caption<'c>(&self, ctx: &VariantContext<'c>) -> Option<&'c str> {
        Some(ctx.config.restart.countdown.as_str())
    }
}

/// Free-form buttons plus a text field
pub struct Input;

impl VariantBehavior for Input {
    fn name(&self) -> &'static str {
        "input"
    }

    fn buttons(&self, ctx: &VariantContext<'_>) -> ButtonRow {
        free_form_buttons(ctx)
    }

    fn resolve_button(&self, slot: ButtonSlot, buttons: &ButtonRow, ctx: &VariantContext<'_>) -> ButtonAction {
        let value = ctx.input.cloned().unwrap_or_else(|| InputValue::plain(""));
        ButtonAction::Finish(DialogOutcome::Input {
            label: buttons.get(slot).label.clone(),
            value,
        })
    }
}

/// Free-form buttons
pub struct Custom;

impl VariantBehavior for Custom {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn buttons(&self, ctx: &VariantContext<'_>) -> ButtonRow {
        free_form_buttons(ctx)
    }

    fn resolve_button(&self, slot: ButtonSlot, buttons: &ButtonRow, _ctx: &VariantContext<'_>) -> ButtonAction {
        ButtonAction::Finish(DialogOutcome::Button {
            label: buttons.get(slot).label.clone(),
        })
    }
}

/// Progress indicator; closed by its owner. Buttons are optional.
pub struct Progress;

impl VariantBehavior for Progress {
    fn name(&self) -> &'static str {
        "progress"
    }

    fn buttons(&self, ctx: &VariantContext<'_>) -> ButtonRow {
        free_form_buttons(ctx)
    }

    fn resolve_button(&self, slot: ButtonSlot, buttons: &ButtonRow, _ctx: &VariantContext<'_>) -> ButtonAction {
        ButtonAction::Finish(DialogOutcome::Button {
            label: buttons.get(slot).label.clone(),
        })
    }
}
