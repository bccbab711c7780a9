//! Update-check eligibility gate
//!
//! After a setting that affects update eligibility changes, the external
//! scheduler is asked to run a check. If an update is already staged and
//! waiting for a reboot the request is suppressed: another check would be
//! wasted work and could race with the pending apply.

use crate::store::SettingsStore;
use crate::types::SettingKey;
use serde::Serialize;
use std::sync::Arc;

/// Requests an update check from the job scheduler
///
/// Implementations must not block: this is a signal, not a call that waits
/// for the check to run.
pub trait Scheduler: Send + Sync {
    /// `immediate` asks for a check now rather than at the next periodic slot
    fn schedule(&self, immediate: bool);
}

/// Controls the idle-reboot subsystem
pub trait RebootControl: Send + Sync {
    /// Cancel any armed idle reboot
    fn cancel(&self);
}

/// Outcome of a gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// The scheduler was invoked
    Scheduled { immediate: bool },
    /// An update is waiting for a reboot; nothing was scheduled
    SuppressedPendingReboot,
    /// The change does not affect eligibility
    NotApplicable,
}

/// Decides whether a settings change re-triggers the update check
#[derive(Clone)]
pub struct EligibilityGate {
    store: SettingsStore,
    scheduler: Arc<dyn Scheduler>,
}

impl EligibilityGate {
    pub fn new(store: SettingsStore, scheduler: Arc<dyn Scheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Evaluate the gate after `key` was written
    pub fn on_setting_changed(&self, key: SettingKey) -> GateDecision {
        if !key.affects_eligibility() {
            return GateDecision::NotApplicable;
        }
        self.trigger(false, key.as_str())
    }

    /// Evaluate the gate for an explicit "check for updates now" request
    pub fn check_now(&self) -> GateDecision {
        self.trigger(true, "check_for_updates")
    }

    fn trigger(&self, immediate: bool, reason: &str) -> GateDecision {
        // Read fresh on every evaluation; the update pipeline may have set
        // the marker since the last change.
        if self.store.waiting_for_reboot() {
            log::info!("Not scheduling update check after {}: reboot pending", reason);
            return GateDecision::SuppressedPendingReboot;
        }
        log::info!(
            "Scheduling {} update check after {}",
            if immediate { "immediate" } else { "periodic" },
            reason
        );
        self.scheduler.schedule(immediate);
        GateDecision::Scheduled { immediate }
    }
}
