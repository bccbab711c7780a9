//! Settings session
//!
//! A [`SettingsSession`] is what a settings screen drives. It can only be
//! started with a [`Guarded`] token from the access guard, so a session for a
//! non-privileged account never exists. Each edit handler writes the store,
//! re-derives what the screen shows and evaluates the eligibility gate in a
//! single step.
//!
//! ```text
//! Uninitialized -> Guarded -> Active -> (Edited -> Active)* -> Suspended -> Active ...
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use updater_settings::{
//!     AccessGuard, BuildDefaults, ChangelogLocator, ExecutionContext, GateDecision,
//!     MemoryBackend, RebootControl, Scheduler, SessionServices, SettingsSession,
//!     SettingsStore, UserId,
//! };
//!
//! struct Noop;
//! impl Scheduler for Noop {
//!     fn schedule(&self, _immediate: bool) {}
//! }
//! impl RebootControl for Noop {
//!     fn cancel(&self) {}
//! }
//!
//! let store = SettingsStore::new(Arc::new(MemoryBackend::new()), BuildDefaults::builtin()?);
//! let services = SessionServices {
//!     store,
//!     scheduler: Arc::new(Noop),
//!     reboot: Arc::new(Noop),
//!     changelog: ChangelogLocator::new(PathBuf::from("/nonexistent/cache")),
//! };
//!
//! let guarded = AccessGuard::default().verify(&ExecutionContext::new(UserId::SYSTEM))?;
//! let mut session = SettingsSession::start(guarded, services)?;
//! assert_eq!(session.display().channel_summary.as_deref(), Some("Beta"));
//!
//! let decision = session.on_channel_changed("stable");
//! assert_eq!(decision, GateDecision::Scheduled { immediate: false });
//! assert_eq!(session.display().channel_summary.as_deref(), Some("Stable"));
//! # Ok::<(), updater_settings::Error>(())
//! ```

use crate::access::{ExecutionContext, Guarded};
use crate::changelog::{ChangelogLocator, ViewRequest, CURRENT_CHANGELOG};
use crate::channel::{canonicalize, ChannelFamily};
use crate::error::Result;
use crate::gate::{EligibilityGate, GateDecision, RebootControl, Scheduler};
use crate::store::SettingsStore;
use crate::types::{NetworkType, SettingKey, SettingValue};
use serde::Serialize;
use std::sync::Arc;

pub const CHANGELOG_SUMMARY: &str = "View the changes in the current release";
pub const CHANGELOG_UNAVAILABLE: &str = "Changelog unavailable";

/// Collaborators a session is wired to
#[derive(Clone)]
pub struct SessionServices {
    pub store: SettingsStore,
    pub scheduler: Arc<dyn Scheduler>,
    pub reboot: Arc<dyn RebootControl>,
    pub changelog: ChangelogLocator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Suspended,
}

/// Derived state shown on the settings screen
///
/// Never a second source of truth: it is rebuilt from the store on start,
/// after edits and on every resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    /// Label of the current channel's family; unchanged for unknown channels
    pub channel_summary: Option<String>,
    pub network_type: i64,
    pub changelog_summary: String,
}

/// Result of tapping the changelog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogOutcome {
    Open(ViewRequest),
    Unavailable,
}

pub struct SettingsSession {
    context: ExecutionContext,
    store: SettingsStore,
    gate: EligibilityGate,
    reboot: Arc<dyn RebootControl>,
    changelog: ChangelogLocator,
    state: SessionState,
    display: DisplayState,
}

impl SettingsSession {
    /// Bring a guarded session to `Active`
    ///
    /// Applies build defaults to the store (once per store) and binds the
    /// displayed fields to the persisted values.
    pub fn start(guarded: Guarded, services: SessionServices) -> Result<Self> {
        let SessionServices {
            store,
            scheduler,
            reboot,
            changelog,
        } = services;

        store.apply_defaults()?;

        let mut session = Self {
            context: guarded.context(),
            gate: EligibilityGate::new(store.clone(), scheduler),
            store,
            reboot,
            changelog,
            state: SessionState::Active,
            display: DisplayState {
                channel_summary: None,
                network_type: 0,
                changelog_summary: CHANGELOG_SUMMARY.to_string(),
            },
        };
        session.refresh_display();
        log::info!("Settings session active for {}", session.context.user);
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// User picked a release channel
    pub fn on_channel_changed(&mut self, channel: &str) -> GateDecision {
        let canonical = canonicalize(channel);
        let decision = self.apply_edit(SettingKey::Channel, canonical.into());
        self.refresh_channel_summary();
        decision
    }

    /// User picked a network constraint
    pub fn on_network_type_changed(&mut self, network_type: NetworkType) -> GateDecision {
        let decision = self.apply_edit(SettingKey::NetworkType, network_type.code().into());
        self.display.network_type = self.store.network_type();
        decision
    }

    /// User toggled "only when battery is not low"
    pub fn on_battery_not_low_changed(&mut self, battery_not_low: bool) -> GateDecision {
        self.apply_edit(SettingKey::BatteryNotLow, battery_not_low.into())
    }

    /// User toggled idle reboot
    ///
    /// Turning it off cancels any armed idle reboot. This never triggers an
    /// update check.
    pub fn on_idle_reboot_changed(&mut self, idle_reboot: bool) -> GateDecision {
        let decision = self.apply_edit(SettingKey::IdleReboot, idle_reboot.into());
        if !idle_reboot {
            log::info!("Idle reboot disabled, cancelling pending idle reboot");
            self.reboot.cancel();
        }
        decision
    }

    /// User tapped "check for updates now"
    pub fn on_check_for_updates(&mut self) -> GateDecision {
        self.note_edit("check_for_updates");
        self.gate.check_now()
    }

    /// User tapped the changelog entry
    pub fn on_changelog_clicked(&mut self) -> ChangelogOutcome {
        match self.changelog.locate(CURRENT_CHANGELOG) {
            Some(request) => ChangelogOutcome::Open(request),
            None => {
                self.display.changelog_summary = CHANGELOG_UNAVAILABLE.to_string();
                ChangelogOutcome::Unavailable
            }
        }
    }

    /// Screen went to the background
    pub fn suspend(&mut self) {
        self.state = SessionState::Suspended;
        log::debug!("Settings session suspended");
    }

    /// Screen came back; re-read everything from the store
    ///
    /// The update pipeline may have changed the store while the screen was
    /// hidden, so nothing displayed is trusted from before.
    pub fn resume(&mut self) {
        if let Err(e) = self.store.reload() {
            log::error!("Failed to reload settings on resume: {}", e);
        }
        self.display.changelog_summary = CHANGELOG_SUMMARY.to_string();
        self.refresh_display();
        self.state = SessionState::Active;
        log::debug!("Settings session resumed");
    }

    fn apply_edit(&mut self, key: SettingKey, value: SettingValue) -> GateDecision {
        self.note_edit(key.as_str());
        self.store.write(key, value);
        self.gate.on_setting_changed(key)
    }

    fn note_edit(&self, what: &str) {
        if self.state == SessionState::Suspended {
            log::warn!("Applying '{}' while the session is suspended", what);
        }
    }

    fn refresh_display(&mut self) {
        self.display.network_type = self.store.network_type();
        self.refresh_channel_summary();
    }

    fn refresh_channel_summary(&mut self) {
        if let Some(family) = ChannelFamily::of(&self.store.channel()) {
            self.display.channel_summary = Some(family.label().to_string());
        }
    }
}
