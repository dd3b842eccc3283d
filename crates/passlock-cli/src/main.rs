//! Passlock CLI - drive the passcode lock from a terminal
//!
//! Each subcommand starts one lock flow over the passcode file. Input is
//! read from stdin one key at a time:
//!
//! - `0`-`9`: enter a digit
//! - `<`: delete the last digit
//! - `!`: cancel
//! - `?`: confirm a passcode reset

mod console;
mod cooldown;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use passlock_core::{
    CredentialStore, EnterMode, FileStore, LockConfig, LockError, LockOrchestrator, LockoutEvent,
    Mode, SetMode, Sign,
};
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::console::{ConsoleListener, SessionEnd};
use crate::cooldown::{CooldownPolicy, CooldownPreset};

#[derive(Parser)]
#[command(name = "passlock")]
#[command(about = "Passcode lock with lockout signaling", long_about = None)]
#[command(version)]
struct Cli {
    /// Passcode file (defaults to the user data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Lock configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Allow cancelling enter and set flows
    #[arg(long, global = true)]
    cancellable: bool,

    /// Wait schedule applied after each lockout
    #[arg(long, global = true, value_enum, default_value_t = CooldownPreset::Standard)]
    cooldown: CooldownPreset,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unlock with the stored passcode
    Enter,

    /// Enroll a new passcode
    Set,

    /// Replace the stored passcode
    Change,

    /// Delete the stored passcode
    Remove,

    /// Forgot-passcode reset
    Reset,

    /// Show the passcode file state as JSON
    Status,

    /// Write the default configuration
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Error)]
enum SessionError {
    #[error("input closed before the lock flow completed")]
    InputClosed,

    #[error("cancelled")]
    Cancelled,
}

/// One keystroke of interactive input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Digit(Sign),
    Delete,
    Cancel,
    ConfirmReset,
}

impl Key {
    fn parse(c: char) -> Option<Self> {
        match c {
            '<' => Some(Key::Delete),
            '!' => Some(Key::Cancel),
            '?' => Some(Key::ConfirmReset),
            c => Sign::from_char(c).map(Key::Digit),
        }
    }
}

/// Lock flow run by an interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Enter,
    Set,
    Change,
    Remove,
    Reset,
}

impl Flow {
    /// A fresh mode instance for this flow
    fn mode(self, cancellable: bool) -> Mode {
        match self {
            Flow::Enter => EnterMode::new().cancellable(cancellable).into(),
            Flow::Set => SetMode::new().cancellable(cancellable).into(),
            Flow::Change => Mode::change(),
            Flow::Remove => Mode::remove(),
            Flow::Reset => Mode::reset(),
        }
    }
}

/// Counts lockouts over a session and turns each into a cooldown
///
/// A mode instance signals lockout only once, so every lockout re-arms the
/// flow with a fresh instance. Its counter restarts and the next run of
/// wrong guesses escalates to the following cooldown level.
struct LockoutGuard {
    events: broadcast::Receiver<LockoutEvent>,
    count: u32,
    cooldown: CooldownPolicy,
    flow: Flow,
    cancellable: bool,
}

impl LockoutGuard {
    fn new<S: CredentialStore>(
        lock: &LockOrchestrator<S>,
        cooldown: CooldownPolicy,
        flow: Flow,
        cancellable: bool,
    ) -> Self {
        Self {
            events: lock.subscribe_lockouts(),
            count: 0,
            cooldown,
            flow,
            cancellable,
        }
    }

    /// Consume pending lockout signals; returns the wait owed, if any
    fn drain<S: CredentialStore>(&mut self, lock: &mut LockOrchestrator<S>) -> Option<Duration> {
        let mut wait = None;
        let mut signalled = false;

        while let Ok(event) = self.events.try_recv() {
            self.count += 1;
            signalled = true;
            warn!(?event, lockouts = self.count, "Lockout signalled");
            wait = self.cooldown.cooldown(self.count).or(wait);
        }

        if signalled {
            lock.change_mode(self.flow.mode(self.cancellable));
        }
        wait
    }

    fn describe(&self) -> String {
        self.cooldown.describe(self.count)
    }
}

#[derive(Debug, Serialize)]
struct StoreStatus {
    path: PathBuf,
    has_passcode: bool,
    passcode_set_at: Option<DateTime<Utc>>,
    last_reset_at: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passlock=info,passlock_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let store_path = cli.store.clone().unwrap_or_else(FileStore::default_path);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| store_path.with_file_name("config.json"));

    let flow = match cli.command {
        Commands::Enter => Flow::Enter,
        Commands::Set => Flow::Set,
        Commands::Change => Flow::Change,
        Commands::Remove => Flow::Remove,
        Commands::Reset => Flow::Reset,
        Commands::Status => return print_status(&store_path),
        Commands::InitConfig { force } => return init_config(&config_path, force),
    };

    let config = load_config(&config_path)?;
    let store = FileStore::open(&store_path)
        .with_context(|| format!("Failed to open passcode file {:?}", store_path))?;

    run_session(config, store, flow, cli.cancellable, cli.cooldown.into()).await
}

fn load_config(path: &Path) -> Result<LockConfig> {
    if path.exists() {
        let config = LockConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?;
        debug!(?path, "Loaded lock configuration");
        Ok(config)
    } else {
        debug!(?path, "No config file, using defaults");
        Ok(LockConfig::default())
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
    }
    LockConfig::default().save(path)?;
    info!("Created default config at {:?}", path);
    println!("{}", path.display());
    Ok(())
}

fn print_status(store_path: &Path) -> Result<()> {
    let store = FileStore::open(store_path)?;
    let status = StoreStatus {
        path: store.path().to_path_buf(),
        has_passcode: store.has_passcode()?,
        passcode_set_at: store.passcode_set_at(),
        last_reset_at: store.last_reset_at(),
    };
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn run_session(
    config: LockConfig,
    store: FileStore,
    flow: Flow,
    cancellable: bool,
    cooldown: CooldownPolicy,
) -> Result<()> {
    let listener = Arc::new(ConsoleListener::new());
    let mut lock = LockOrchestrator::new(config, store, flow.mode(cancellable))?;
    lock.set_listener(&listener);

    let mut guard = LockoutGuard::new(&lock, cooldown, flow, cancellable);
    let reset_marker = lock.store().last_reset_at();

    info!(mode = ?lock.mode().kind(), store = ?lock.store().path(), "Lock session started");
    lock.activate();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if listener.take_prompt_stale() {
            print_prompt(&lock);
        }

        let Some(line) = lines.next_line().await? else {
            return Err(SessionError::InputClosed.into());
        };

        for c in line.chars().filter(|c| !c.is_whitespace()) {
            let Some(key) = Key::parse(c) else {
                warn!(key = %c, "Ignoring unknown key");
                continue;
            };
            press(&mut lock, key);

            if let Some(wait) = guard.drain(&mut lock) {
                println!("{}", guard.describe());
                tokio::time::sleep(wait).await;
                // Keys typed ahead of the lockout are dropped
                break;
            }

            if lock.store().last_reset_at() != reset_marker {
                println!("Passcode reset");
                return Ok(());
            }

            match listener.end() {
                Some(SessionEnd::Succeeded) => {
                    println!("Done");
                    return Ok(());
                }
                Some(SessionEnd::Cancelled) => return Err(SessionError::Cancelled.into()),
                None => {}
            }

            if listener.take_prompt_stale() {
                print_prompt(&lock);
            }
        }
    }
}

/// Apply one key; failures are already rendered by the listener or here
fn press<S: CredentialStore>(lock: &mut LockOrchestrator<S>, key: Key) {
    let result = match key {
        Key::Digit(sign) => lock.add_sign(sign).map(drop),
        Key::Delete => {
            lock.remove_sign();
            Ok(())
        }
        Key::Cancel => lock.cancel().map_err(report),
        Key::ConfirmReset => lock.confirm_reset().map_err(report),
    };

    if let Err(error) = result {
        debug!(%error, ?key, "Key rejected");
    }
}

fn report(error: LockError) -> LockError {
    println!("{}", error);
    error
}

fn print_prompt(lock: &LockOrchestrator<FileStore>) {
    let prompt = lock.mode().prompt();
    let mut hints = Vec::new();
    if lock.mode().is_cancellable() {
        hints.push("! cancel");
    }
    if lock.is_reset_allowed_now() {
        hints.push("? reset");
    }

    if hints.is_empty() {
        println!("{}: {}", prompt.title, prompt.description);
    } else {
        println!("{}: {} ({})", prompt.title, prompt.description, hints.join(", "));
    }
}
