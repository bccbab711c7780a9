use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for updater-settings
#[derive(Parser, Debug)]
#[command(name = "updater-settings")]
#[command(about = "Inspect and change OTA update client settings")]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where settings live and how to reach the external collaborators
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Application data directory (settings live in its device-protected domain)
    #[arg(long, default_value = "/var/lib/updater-settings")]
    pub data_dir: PathBuf,

    /// Cache directory holding downloaded changelogs
    #[arg(long, default_value = "/var/cache/updater-settings")]
    pub cache_dir: PathBuf,

    /// INI file overriding the built-in defaults
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    /// Command spawned to request an update check ("--immediate" appended when urgent)
    #[arg(long)]
    pub scheduler_cmd: Option<String>,

    /// Command spawned to cancel a pending idle reboot
    #[arg(long)]
    pub reboot_cmd: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show all settings as JSON
    Show {
        /// Only keys matching any of these glob patterns (e.g. "*_reboot")
        #[arg(short, long)]
        query: Vec<String>,
    },
    /// Print a single setting
    Get {
        /// Setting key (channel, network_type, battery_not_low, idle_reboot, waiting_for_reboot)
        key: String,
    },
    /// Switch release channel
    SetChannel { channel: String },
    /// Set the network constraint (any, unmetered, not_roaming or 1-3)
    SetNetworkType { network_type: String },
    /// Only check for updates when the battery is not low
    SetBatteryNotLow {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Allow rebooting when idle to apply a staged update
    SetIdleReboot {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Request an immediate update check
    CheckNow,
    /// Resolve a cached changelog for the viewer
    Changelog {
        #[arg(default_value = "current.html")]
        filename: String,
    },
    /// Print the canonical form of a channel name
    Canonicalize { raw: String },
    /// Set the reboot-pending marker as the update pipeline would
    MarkRebootPending {
        #[arg(action = clap::ArgAction::Set)]
        pending: bool,
    },
}
