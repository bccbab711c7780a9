use crate::cli::{Cli, Commands, SettingsArgs};
use anyhow::Context;
use std::process::Command;
use std::sync::Arc;
use updater_settings::{
    canonicalize, query_settings, AccessGuard, BuildDefaults, ChangelogLocator, ChangelogOutcome,
    ExecutionContext, FileBackend, NetworkType, RebootControl, Scheduler, SessionServices,
    SettingKey, SettingValue, SettingsSession, SettingsStore, CURRENT_CHANGELOG,
};

/// Spawns an external command to request an update check
///
/// The child is not waited on. Without a command the request is only logged.
pub struct CommandScheduler {
    command: Option<String>,
}

impl CommandScheduler {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

impl Scheduler for CommandScheduler {
    fn schedule(&self, immediate: bool) {
        let extra: &[&str] = if immediate { &["--immediate"] } else { &[] };
        spawn_detached("scheduler", self.command.as_deref(), extra);
    }
}

/// Spawns an external command to cancel the idle reboot
pub struct CommandRebootControl {
    command: Option<String>,
}

impl CommandRebootControl {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

impl RebootControl for CommandRebootControl {
    fn cancel(&self) {
        spawn_detached("idle reboot cancel", self.command.as_deref(), &[]);
    }
}

fn spawn_detached(what: &str, command: Option<&str>, extra: &[&str]) {
    let Some(command) = command else {
        log::info!("No {} command configured, skipping", what);
        return;
    };
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        log::warn!("Empty {} command", what);
        return;
    };
    match Command::new(program).args(parts).args(extra).spawn() {
        Ok(child) => log::debug!("Spawned {} command (pid {})", what, child.id()),
        Err(e) => log::warn!("Failed to spawn {} command '{}': {}", what, command, e),
    }
}

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Canonicalize { raw } => {
            println!("{}", canonicalize(&raw));
            Ok(())
        }
        command => run_in_session(&cli.settings, command),
    }
}

/// Run a command that touches settings through a guarded session
fn run_in_session(
    args: &SettingsArgs,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    // Fatal: nothing below may run for a non-privileged account
    let guarded = AccessGuard::default()
        .verify(&ExecutionContext::current())
        .map_err(|e| anyhow::anyhow!("{e}. Run updater-settings as the system user."))?;

    let store = open_store(args)?;
    let services = SessionServices {
        store: store.clone(),
        scheduler: Arc::new(CommandScheduler::new(args.scheduler_cmd.clone())),
        reboot: Arc::new(CommandRebootControl::new(args.reboot_cmd.clone())),
        changelog: ChangelogLocator::new(&args.cache_dir),
    };
    let changelog = services.changelog.clone();
    let mut session = SettingsSession::start(guarded, services)
        .map_err(|e| anyhow::anyhow!("Failed to start settings session: {e}"))?;

    match command {
        Commands::Show { query } => {
            let snapshot = store.snapshot();
            let output = if query.is_empty() {
                snapshot
            } else {
                let patterns: Vec<&str> = query.iter().map(String::as_str).collect();
                query_settings(&snapshot, &patterns)
                    .map_err(|e| anyhow::anyhow!("Failed to apply query: {}", e))?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Get { key } => {
            let key: SettingKey = key.parse()?;
            let value = match key {
                SettingKey::Channel => SettingValue::String(store.channel()),
                other => store.read(other),
            };
            output_raw_value(&value);
        }
        Commands::SetChannel { channel } => {
            print_json(&session.on_channel_changed(&channel))?;
        }
        Commands::SetNetworkType { network_type } => {
            let network_type: NetworkType = network_type.parse()?;
            print_json(&session.on_network_type_changed(network_type))?;
        }
        Commands::SetBatteryNotLow { enabled } => {
            print_json(&session.on_battery_not_low_changed(enabled))?;
        }
        Commands::SetIdleReboot { enabled } => {
            print_json(&session.on_idle_reboot_changed(enabled))?;
        }
        Commands::CheckNow => {
            print_json(&session.on_check_for_updates())?;
        }
        Commands::Changelog { filename } => {
            let outcome = if filename == CURRENT_CHANGELOG {
                session.on_changelog_clicked()
            } else {
                match changelog.locate(&filename) {
                    Some(request) => ChangelogOutcome::Open(request),
                    None => ChangelogOutcome::Unavailable,
                }
            };
            match outcome {
                ChangelogOutcome::Open(request) => print_json(&request)?,
                ChangelogOutcome::Unavailable => println!("unavailable"),
            }
        }
        Commands::MarkRebootPending { pending } => {
            store
                .try_write(SettingKey::WaitingForReboot, SettingValue::Bool(pending))
                .context("Failed to write reboot-pending marker")?;
        }
        Commands::Canonicalize { raw } => {
            println!("{}", canonicalize(&raw));
        }
    }

    Ok(())
}

fn open_store(args: &SettingsArgs) -> anyhow::Result<SettingsStore> {
    let defaults = match &args.defaults {
        Some(path) => BuildDefaults::from_ini_file(path)
            .with_context(|| format!("Failed to load defaults from {}", path.display()))?,
        None => BuildDefaults::builtin().context("Built-in defaults are invalid")?,
    };
    let backend = FileBackend::open_device_protected(&args.data_dir).with_context(|| {
        format!(
            "Failed to open settings under {}. Make sure the directory is readable.",
            args.data_dir.display()
        )
    })?;
    Ok(SettingsStore::new(Arc::new(backend), defaults))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output a single setting value in raw format (no JSON wrapping)
fn output_raw_value(value: &SettingValue) {
    match value {
        SettingValue::String(s) => println!("{}", s),
        SettingValue::Bool(b) => println!("{}", b),
        SettingValue::Integer(i) => println!("{}", i),
    }
}
