//! Deployment dialog runner
//!
//! Shows one deployment dialog in the terminal and prints the result as
//! JSON on stdout.
//!
//! # Architecture
//!
//! - Main thread: runs the dialog session on its own single-threaded runtime
//! - Stdin thread: turns key presses into button clicks
//! - Progress dialogs: a worker thread drives `UpdateProgress` and closes
//!   the dialog when done
//!
//! # Usage
//!
//! ```bash
//! deploy-dialog close-apps --message "Please close [bold]Word[/bold]" \
//!   --blocking winword=Microsoft Word --countdown 60 --deferrals 2
//! deploy-dialog restart --countdown 600 --warning 60
//! deploy-dialog --config dialog.toml input --secure
//! deploy-dialog progress --steps 5
//! ```

mod terminal;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use deploy_dialogs::{
    BlockingApplication, BlockingApplicationSet, Collaborators, CommandRestart, DialogConfiguration,
    DialogHandle, DialogKind, DialogOutcome, DialogResult, DialogSession, LoggingRestart,
    ProcessMonitorFeed,
};

use terminal::TerminalHost;

#[derive(Parser, Debug)]
#[command(name = "deploy-dialog")]
#[command(about = "Show a deployment dialog and print the outcome as JSON")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Dialog configuration file (JSON, or TOML with a .toml extension)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Dialog title
    #[arg(long, short, global = true)]
    title: Option<String>,

    /// Message markup
    #[arg(long, short, global = true)]
    message: Option<String>,

    /// Countdown in seconds
    #[arg(long, global = true)]
    countdown: Option<u64>,

    /// Countdown warning window in seconds
    #[arg(long, global = true)]
    warning: Option<u64>,

    /// Close the dialog after this many seconds
    #[arg(long, global = true)]
    expiry: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the user to close running applications
    CloseApps {
        /// Blocking application as NAME=DESCRIPTION (repeatable)
        #[arg(long, short)]
        blocking: Vec<String>,
        /// Deferrals left
        #[arg(long)]
        deferrals: Option<u32>,
        /// Resolve the countdown as if the user had chosen
        #[arg(long)]
        forced: bool,
        /// Continue as soon as no blocking application is running
        #[arg(long)]
        continue_on_closure: bool,
    },

    /// Prompt for a restart
    Restart {
        /// Actually restart the computer (otherwise a dry run)
        #[arg(long)]
        allow_restart: bool,
    },

    /// Prompt for text
    Input {
        /// Mask the input
        #[arg(long)]
        secure: bool,
        /// Initial field text
        #[arg(long, default_value = "")]
        initial: String,
        #[arg(long, default_value = "OK")]
        ok: String,
        #[arg(long, default_value = "Cancel")]
        cancel: String,
    },

    /// Show up to three custom buttons
    Custom {
        #[arg(long)]
        left: Option<String>,
        #[arg(long)]
        middle: Option<String>,
        #[arg(long)]
        right: Option<String>,
    },

    /// Show a simulated progress dialog
    Progress {
        /// Number of progress steps
        #[arg(long, default_value = "5")]
        steps: u32,
        /// Milliseconds between steps
        #[arg(long, default_value = "800")]
        interval_ms: u64,
    },
}

fn parse_blocking(entry: &str) -> BlockingApplication {
    match entry.split_once('=') {
        Some((name, description)) => BlockingApplication::new(name.trim(), description.trim()),
        None => BlockingApplication::new(entry.trim(), entry.trim()),
    }
}

fn simulate_progress(handle: DialogHandle, steps: u32, interval: Duration) {
    let steps = steps.max(1);
    for step in 1..=steps {
        std::thread::sleep(interval);
        let percent = f64::from(step) * 100.0 / f64::from(steps);
        let detail = format!("Step {} of {}", step, steps);
        if handle.update_progress(None, Some(detail), Some(percent)).is_err() {
            return;
        }
    }
    std::thread::sleep(interval);
    handle.close_dialog();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the dialog and the JSON result
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting deploy-dialog v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => DialogConfiguration::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => DialogConfiguration {
            title: "Software Deployment".into(),
            message: "An installation is about to begin.".into(),
            ..Default::default()
        },
    };
    if let Some(title) = args.title {
        config.title = title;
    }
    if let Some(message) = args.message {
        config.message = message;
    }
    config.countdown_secs = args.countdown.or(config.countdown_secs);
    config.countdown_warning_secs = args.warning.or(config.countdown_warning_secs);
    config.expiry_secs = args.expiry.or(config.expiry_secs);

    let mut collaborators =
        Collaborators::new(TerminalHost::new()).with_restart(Arc::new(LoggingRestart));
    let mut progress = None;

    let kind = match args.command {
        Commands::CloseApps {
            blocking,
            deferrals,
            forced,
            continue_on_closure,
        } => {
            config.deferrals_remaining = deferrals.or(config.deferrals_remaining);
            config.forced_countdown |= forced;
            config.continue_on_process_closure |= continue_on_closure;
            let set: BlockingApplicationSet = blocking.iter().map(|b| parse_blocking(b)).collect();
            collaborators = collaborators.with_monitor(Arc::new(ProcessMonitorFeed::new(set)));
            DialogKind::CloseApps
        }
        Commands::Restart { allow_restart } => {
            if allow_restart {
                collaborators = collaborators.with_restart(Arc::new(CommandRestart));
            }
            DialogKind::Restart
        }
        Commands::Input {
            secure,
            initial,
            ok,
            cancel,
        } => {
            if config.buttons.is_empty() {
                config.buttons.left = Some(cancel);
                config.buttons.right = Some(ok);
            }
            DialogKind::Input {
                secure,
                initial_text: initial,
            }
        }
        Commands::Custom { left, middle, right } => {
            config.buttons.left = left.or(config.buttons.left);
            config.buttons.middle = middle.or(config.buttons.middle);
            config.buttons.right = right.or(config.buttons.right);
            DialogKind::Custom
        }
        Commands::Progress { steps, interval_ms } => {
            progress = Some((steps, Duration::from_millis(interval_ms)));
            DialogKind::Progress
        }
    };

    let label = kind.label();
    let session = DialogSession::new(kind, config, collaborators).context("invalid dialog")?;
    let id = session.id();

    if let Some((steps, interval)) = progress {
        let handle = session.handle();
        std::thread::spawn(move || simulate_progress(handle, steps, interval));
    }

    let outcome = match session.show_dialog() {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Dialog failed: {}", e);
            return Err(e.into());
        }
    };

    let result = DialogResult::new(id.to_string(), label, outcome.clone());
    println!("{}", serde_json::to_string_pretty(&result)?);

    // Exit with error if nobody answered; progress dialogs always close this way
    if outcome == DialogOutcome::Timeout && label != "progress" {
        std::process::exit(1);
    }
    Ok(())
}
