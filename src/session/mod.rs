//! Dialog session state machine
//!
//! A `DialogSession` owns one dialog from construction to teardown:
//!
//! ```text
//! Constructed -> Loaded -> Active -> Closing -> Closed
//! ```
//!
//! # Architecture
//!
//! - The session is an actor: all of its state lives on the task running
//!   [`DialogSession::run`]
//! - Timers, the process-monitor feed and the host post `Trigger`s into one
//!   unbounded mailbox; triggers are handled strictly in arrival order
//! - The first terminal trigger decides the `DialogOutcome`; everything after
//!   that is ignored
//! - Teardown (timers, subscriptions, cached icon references) runs exactly
//!   once, guarded by a disposed flag

mod handle;
pub mod variant;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{DialogConfiguration, DialogKind};
use crate::countdown::{format_remaining, CountdownState};
use crate::deferral::DeferralPolicy;
use crate::error::{DialogError, Result};
use crate::host::{CommandRestart, DialogHost, RestartPrimitive};
use crate::icons::{FileIconLoader, Icon, IconCache, IconLoader};
use crate::markup::MarkupRenderer;
use crate::monitor::{BlockingApplicationSet, ProcessMonitor, SetTransition};
use crate::outcome::{DialogOutcome, InputValue, OutcomeCell};
use crate::position::{WindowPlacement, WindowPosition, WorkArea};
use crate::progress::{ProgressAnimation, FRAME_INTERVAL};
use crate::timers::TimerSubsystem;
use crate::view::{
    AppEntry, ButtonSlot, CountdownView, DialogView, InputFieldView, ProgressView,
};

pub use handle::DialogHandle;
use variant::{behavior_for, ButtonAction, SideEffect, VariantBehavior, VariantContext};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Constructed,
    Loaded,
    Active,
    Closing,
    Closed,
}

/// Message delivered to the session mailbox
pub enum Trigger {
    ButtonClicked(ButtonSlot),
    CountdownTick,
    ExternalExpiry,
    PersistPosition,
    BlockingApplicationsChanged(BlockingApplicationSet),
    InputChanged(String),
    UpdateProgress {
        message: Option<String>,
        detail: Option<String>,
        percent: Option<f64>,
    },
    WindowMoved(WindowPosition),
    DisplayChanged(WorkArea),
    CloseRequested,
}

impl Trigger {
    /// Short name for logs (never includes user input)
    pub fn name(&self) -> &'static str {
        match self {
            Trigger::ButtonClicked(_) => "button_clicked",
            Trigger::CountdownTick => "countdown_tick",
            Trigger::ExternalExpiry => "external_expiry",
            Trigger::PersistPosition => "persist_position",
            Trigger::BlockingApplicationsChanged(_) => "blocking_applications_changed",
            Trigger::InputChanged(_) => "input_changed",
            Trigger::UpdateProgress { .. } => "update_progress",
            Trigger::WindowMoved(_) => "window_moved",
            Trigger::DisplayChanged(_) => "display_changed",
            Trigger::CloseRequested => "close_requested",
        }
    }
}

/// External collaborators a session depends on
pub struct Collaborators {
    pub host: Box<dyn DialogHost>,
    /// Shared, process-wide icon caches
    pub icons: Arc<IconCache>,
    pub icon_loader: Arc<dyn IconLoader>,
    pub restart: Arc<dyn RestartPrimitive>,
    pub monitor: Option<Arc<dyn ProcessMonitor>>,
}

impl Collaborators {
    pub fn new(host: impl DialogHost + 'static) -> Self {
        Self {
            host: Box::new(host),
            icons: Arc::new(IconCache::new()),
            icon_loader: Arc::new(FileIconLoader),
            restart: Arc::new(CommandRestart),
            monitor: None,
        }
    }

    pub fn with_icons(mut self, icons: Arc<IconCache>) -> Self {
        self.icons = icons;
        self
    }

    pub fn with_icon_loader(mut self, loader: Arc<dyn IconLoader>) -> Self {
        self.icon_loader = loader;
        self
    }

    pub fn with_restart(mut self, restart: Arc<dyn RestartPrimitive>) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn ProcessMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }
}

/// Subscriptions registered while the dialog is visible
#[derive(Debug, Default)]
struct Subscriptions {
    /// Task forwarding process-monitor changes into the mailbox
    monitor: Option<JoinHandle<()>>,
    /// Host move / display / input notifications
    host_events: bool,
}

impl Subscriptions {
    fn count(&self) -> usize {
        usize::from(self.monitor.is_some()) + usize::from(self.host_events)
    }

    fn unsubscribe_all(&mut self) {
        if let Some(task) = self.monitor.take() {
            task.abort();
        }
        self.host_events = false;
    }
}

struct ProgressState {
    animation: ProgressAnimation,
    detail: Option<String>,
    next_frame: Option<Instant>,
}

pub struct DialogSession {
    id: Uuid,
    kind: DialogKind,
    config: DialogConfiguration,
    state: SessionState,
    behavior: Box<dyn VariantBehavior>,
    host: Box<dyn DialogHost>,
    icons: Arc<IconCache>,
    icon_loader: Arc<dyn IconLoader>,
    restart: Arc<dyn RestartPrimitive>,
    monitor: Option<Arc<dyn ProcessMonitor>>,
    /// Current message markup
    message: String,
    countdown: Option<CountdownState>,
    deferral: DeferralPolicy,
    blocking: BlockingApplicationSet,
    input: Option<InputValue>,
    progress: Option<ProgressState>,
    placement: Option<WindowPlacement>,
    view: DialogView,
    timers: TimerSubsystem,
    subscriptions: Subscriptions,
    tx: UnboundedSender<Trigger>,
    rx: UnboundedReceiver<Trigger>,
    outcome: OutcomeCell,
    decided: Option<DialogOutcome>,
    disposed: bool,
}

impl DialogSession {
    /// Build a session. Configuration problems fail here, before anything
    /// is shown.
    pub fn new(kind: DialogKind, config: DialogConfiguration, collaborators: Collaborators) -> Result<Self> {
        config.validate(&kind)?;

        let Collaborators {
            host,
            icons,
            icon_loader,
            restart,
            monitor,
        } = collaborators;

        let blocking = match &monitor {
            Some(monitor) => monitor.snapshot()?,
            None => BlockingApplicationSet::default(),
        };

        let input = match &kind {
            DialogKind::Input { secure: true, initial_text } => Some(InputValue::secure(initial_text.clone())),
            DialogKind::Input { initial_text, .. } => Some(InputValue::plain(initial_text.clone())),
            _ => None,
        };

        let progress = matches!(kind, DialogKind::Progress).then(|| ProgressState {
            animation: ProgressAnimation::at_rest(0.0, Instant::now()),
            detail: None,
            next_frame: None,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = Self {
            id: Uuid::new_v4(),
            behavior: behavior_for(&kind),
            message: config.message.clone(),
            countdown: config
                .countdown()
                .map(|duration| CountdownState::new(duration, config.countdown_warning())),
            deferral: DeferralPolicy::new(
                config.deferrals_remaining,
                config.deferral_deadline,
                config.forced_countdown,
            ),
            kind,
            config,
            state: SessionState::Constructed,
            host,
            icons,
            icon_loader,
            restart,
            monitor,
            blocking,
            input,
            progress,
            placement: None,
            view: DialogView::default(),
            timers: TimerSubsystem::new(),
            subscriptions: Subscriptions::default(),
            tx,
            rx,
            outcome: OutcomeCell::new(),
            decided: None,
            disposed: false,
        };
        session.rebuild_view();
        debug!(session = %session.id, kind = session.behavior.name(), "Dialog session constructed");
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &DialogKind {
        &self.kind
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current view model
    pub fn view(&self) -> &DialogView {
        &self.view
    }

    pub fn outcome(&self) -> Option<DialogOutcome> {
        self.outcome.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Timers currently owned by the session
    pub fn active_timers(&self) -> usize {
        self.timers.active_count()
    }

    /// Subscriptions currently registered
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.count()
    }

    /// Thread-safe handle for clicks, progress updates and `close_dialog`
    pub fn handle(&self) -> DialogHandle {
        DialogHandle::new(self.id, self.tx.clone(), self.outcome.clone())
    }

    /// Show the dialog and block until it closes.
    ///
    /// Runs the session on a dedicated single-threaded runtime. Must not be
    /// called from inside an async context; use [`DialogSession::run`] there.
    pub fn show_dialog(self) -> Result<DialogOutcome> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(DialogError::Runtime(
                "show_dialog called from inside an async runtime, use run instead".into(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| DialogError::Runtime(format!("failed to build dialog runtime: {}", e)))?;
        runtime.block_on(self.run())
    }

    /// Show the dialog and run it to completion
    pub async fn run(mut self) -> Result<DialogOutcome> {
        let result = self.drive().await;
        self.close();
        result
    }

    async fn drive(&mut self) -> Result<DialogOutcome> {
        self.load()?;

        loop {
            if let Some(outcome) = &self.decided {
                return Ok(outcome.clone());
            }

            let frame = self.progress.as_ref().and_then(|p| p.next_frame);
            let trigger = tokio::select! {
                trigger = self.rx.recv() => trigger,
                _ = sleep_until(frame.unwrap_or_else(Instant::now)), if frame.is_some() => {
                    self.on_animation_frame();
                    continue;
                }
            };

            match trigger {
                Some(trigger) => self.dispatch(trigger)?,
                None => return Err(DialogError::SessionClosed),
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(session = %self.id, from = ?self.state, to = ?next, "Dialog state change");
        self.state = next;
    }

    /// Constructed -> Loaded -> Active
    fn load(&mut self) -> Result<()> {
        if self.state != SessionState::Constructed {
            return Ok(());
        }

        self.rebuild_view();
        let handle = self.handle();
        let size = self.host.show(&self.view, handle)?;
        let position = self.config.position.locate(self.host.work_area(), size);
        self.host.place(position);
        self.placement = Some(WindowPlacement { position, size });
        self.transition(SessionState::Loaded);

        if let Some(countdown) = self.countdown.as_mut() {
            countdown.start(Instant::now());
            self.timers.start_countdown(self.tx.clone());
        }
        if let Some(expiry) = self.config.expiry() {
            self.timers.start_expiry(expiry, self.tx.clone());
        }
        if let Some(interval) = self.config.persist_interval() {
            self.timers.start_persist(interval, self.tx.clone());
        }
        self.subscribe()?;

        self.transition(SessionState::Active);
        info!(session = %self.id, kind = self.behavior.name(), title = %self.config.title, "Dialog shown");
        Ok(())
    }

    fn subscribe(&mut self) -> Result<()> {
        self.subscriptions.host_events = true;

        let Some(monitor) = &self.monitor else {
            return Ok(());
        };
        let mut rx = monitor.subscribe()?;

        // Catch up with anything published since construction
        let current = rx.borrow_and_update().clone();
        if current != self.blocking {
            let _ = self.tx.send(Trigger::BlockingApplicationsChanged(current));
        }

        let tx = self.tx.clone();
        let id = self.id;
        self.subscriptions.monitor = Some(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                if tx.send(Trigger::BlockingApplicationsChanged(snapshot)).is_err() {
                    break;
                }
            }
            debug!(session = %id, "Process monitor feed ended");
        }));
        Ok(())
    }

    fn dispatch(&mut self, trigger: Trigger) -> Result<()> {
        if self.disposed || self.state != SessionState::Active {
            debug!(session = %self.id, trigger = trigger.name(), state = ?self.state, "Ignoring trigger");
            return Ok(());
        }

        match trigger {
            Trigger::ButtonClicked(slot) => self.on_button(slot),
            Trigger::CountdownTick => self.on_countdown_tick(),
            Trigger::ExternalExpiry => {
                info!(session = %self.id, "Dialog expired");
                self.finish(DialogOutcome::Timeout)
            }
            Trigger::PersistPosition => {
                self.restore_window();
                self.refresh();
                Ok(())
            }
            Trigger::BlockingApplicationsChanged(set) => {
                self.on_blocking_changed(set);
                Ok(())
            }
            Trigger::InputChanged(text) => {
                self.on_input_changed(text);
                Ok(())
            }
            Trigger::UpdateProgress {
                message,
                detail,
                percent,
            } => {
                self.on_update_progress(message, detail, percent);
                Ok(())
            }
            Trigger::WindowMoved(position) => {
                self.on_window_moved(position);
                Ok(())
            }
            Trigger::DisplayChanged(area) => {
                self.on_display_changed(area);
                Ok(())
            }
            Trigger::CloseRequested => {
                debug!(session = %self.id, "Close requested");
                self.finish(DialogOutcome::Timeout)
            }
        }
    }

    fn context(&self) -> VariantContext<'_> {
        VariantContext {
            config: &self.config,
            message: &self.message,
            deferral: &self.deferral,
            blocking: &self.blocking,
            input: self.input.as_ref(),
            in_warning: self
                .countdown
                .as_ref()
                .is_some_and(|c| c.in_warning(Instant::now())),
            now: Utc::now(),
        }
    }

    fn on_button(&mut self, slot: ButtonSlot) -> Result<()> {
        // Enablement depends on the clock (deferral deadline), not just the last frame
        self.refresh();
        if !self.view.buttons.get(slot).is_clickable() {
            debug!(session = %self.id, ?slot, "Ignoring click on hidden or disabled button");
            return Ok(());
        }

        let action = self
            .behavior
            .resolve_button(slot, &self.view.buttons, &self.context());
        match action {
            ButtonAction::Finish(outcome) => self.finish(outcome),
            ButtonAction::Minimize => {
                debug!(session = %self.id, "Minimizing dialog");
                self.host.minimize();
                Ok(())
            }
            ButtonAction::Ignore => Ok(()),
        }
    }

    fn on_countdown_tick(&mut self) -> Result<()> {
        self.timers.acknowledge_tick();
        let now = Instant::now();
        let Some(countdown) = self.countdown.as_mut() else {
            return Ok(());
        };
        let entered_warning = countdown.take_warning(now);
        let expired = countdown.take_expiry(now);

        self.refresh();

        if entered_warning && self.behavior.restore_on_warning() {
            debug!(session = %self.id, "Countdown entered warning window");
            self.restore_window();
        }
        if expired {
            let outcome = self.behavior.on_countdown_expired(&self.context());
            info!(session = %self.id, %outcome, "Countdown expired");
            return self.finish(outcome);
        }
        Ok(())
    }

    fn on_blocking_changed(&mut self, set: BlockingApplicationSet) {
        let transition = self.blocking.transition_to(&set);
        if transition == SetTransition::Unchanged {
            return;
        }
        debug!(session = %self.id, ?transition, count = set.len(), "Blocking applications changed");
        self.blocking = set;
        self.refresh();

        if transition == SetTransition::BecameEmpty && self.config.continue_on_process_closure {
            if let Some(slot) = self.behavior.primary_slot(&self.view.buttons) {
                info!(session = %self.id, "All blocking applications closed, continuing");
                let _ = self.tx.send(Trigger::ButtonClicked(slot));
            }
        }
    }

    fn on_input_changed(&mut self, text: String) {
        if !self.subscriptions.host_events {
            return;
        }
        match self.input.as_mut() {
            Some(input) => {
                *input = input.replaced(text);
                self.refresh();
            }
            None => debug!(session = %self.id, "Input change on a dialog without an input field"),
        }
    }

    fn on_update_progress(&mut self, message: Option<String>, detail: Option<String>, percent: Option<f64>) {
        let Some(progress) = self.progress.as_mut() else {
            warn!(session = %self.id, "Progress update sent to a {} dialog", self.behavior.name());
            return;
        };
        let now = Instant::now();
        if let Some(detail) = detail {
            progress.detail = Some(detail);
        }
        if let Some(percent) = percent {
            progress.animation.retarget(percent, now);
            progress.next_frame = Some(now + FRAME_INTERVAL);
        }
        if let Some(message) = message {
            self.message = message;
        }
        self.refresh();
    }

    fn on_animation_frame(&mut self) {
        let now = Instant::now();
        if let Some(progress) = self.progress.as_mut() {
            progress.next_frame = progress
                .animation
                .is_animating(now)
                .then(|| now + FRAME_INTERVAL);
        }
        self.refresh();
    }

    fn on_window_moved(&mut self, position: WindowPosition) {
        if !self.subscriptions.host_events {
            return;
        }
        if !self.config.allow_move {
            debug!(session = %self.id, "Window moved but moving is not allowed, restoring");
            self.restore_window();
            return;
        }
        if let Some(placement) = self.placement.as_mut() {
            placement.position = position;
        }
    }

    fn on_display_changed(&mut self, area: WorkArea) {
        if !self.subscriptions.host_events {
            return;
        }
        let Some(placement) = self.placement.as_mut() else {
            return;
        };
        placement.position = self.config.position.locate(area, placement.size);
        debug!(session = %self.id, left = placement.position.left, top = placement.position.top, "Display changed, repositioning");
        self.host.place(placement.position);
    }

    fn restore_window(&mut self) {
        if let Some(placement) = self.placement {
            self.host.restore(placement);
        }
    }

    /// Decide the outcome: Active -> Closing
    fn finish(&mut self, outcome: DialogOutcome) -> Result<()> {
        if self.state != SessionState::Active {
            return Ok(());
        }
        if let Some(SideEffect::RestartComputer) = self.behavior.side_effect(&outcome) {
            self.restart.restart_now()?;
        }

        self.transition(SessionState::Closing);
        if !self.outcome.set(outcome.clone()) {
            warn!(session = %self.id, "Dialog outcome was already set, keeping the first one");
        }
        info!(session = %self.id, %outcome, "Dialog outcome decided");
        self.decided = Some(outcome);
        Ok(())
    }

    /// Closing -> Closed: tear down and let the window go
    fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let shown = self.state != SessionState::Constructed;
        self.dispose();
        if shown {
            self.host.close();
        }
        self.transition(SessionState::Closed);
    }

    /// Stop timers, drop subscriptions and release cached resources.
    ///
    /// Runs once; later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.timers.stop();
        self.subscriptions.unsubscribe_all();
        self.view.release_resources();
        self.rx.close();
        debug!(session = %self.id, "Dialog session disposed");
    }

    fn refresh(&mut self) {
        self.rebuild_view();
        self.host.refresh(&self.view);
    }

    fn rebuild_view(&mut self) {
        if self.disposed {
            return;
        }
        let now = Instant::now();
        let ctx = self.context();

        let buttons = self.behavior.buttons(&ctx);
        let message = MarkupRenderer::render(&self.behavior.message(&ctx));
        let deferral_lines = self.behavior.deferral_lines(&ctx);
        let countdown = self.countdown.as_ref().map(|countdown| {
            let remaining = countdown.remaining(now);
            let time = format_remaining(remaining);
            let text = match self.behavior.countdown_caption(&ctx) {
                Some(caption) => caption.replace("{time}", &time),
                None => time,
            };
            CountdownView {
                remaining,
                text,
                in_warning: ctx.in_warning,
            }
        });
        let progress = self.progress.as_ref().map(|p| ProgressView {
            detail: p.detail.clone(),
            percent: p.animation.value_at(now),
        });
        let input = self.input.as_ref().map(|value| InputFieldView {
            secure: value.is_secure(),
            display_text: if value.is_secure() {
                "\u{2022}".repeat(value.text().chars().count())
            } else {
                value.text().to_string()
            },
        });

        let loader = self.icon_loader.as_ref();
        let icon = self
            .config
            .icon
            .as_deref()
            .map(|path| self.icons.icon(path, loader));
        let blocking_apps = self
            .blocking
            .iter()
            .map(|app| AppEntry {
                name: app.name.clone(),
                description: app.description.clone(),
                icon: match &app.path {
                    Some(path) => self.icons.app_icon(path, loader),
                    None => Arc::new(Icon::fallback()),
                },
            })
            .collect();

        self.view = DialogView {
            title: self.config.title.clone(),
            subtitle: self.config.subtitle.clone(),
            icon,
            message,
            buttons,
            countdown,
            deferral_lines,
            blocking_apps,
            progress,
            input,
        };
    }
}

impl Drop for DialogSession {
    fn drop(&mut self) {
        self.close();
    }
}
