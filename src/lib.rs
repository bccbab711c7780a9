//! # updater-settings - OTA update client settings
//!
//! This library owns the durable settings of an over-the-air update client:
//! which release channel to follow, the network and battery constraints for
//! update checks, and whether the device may reboot when idle to apply a
//! staged update. It re-triggers the update check whenever a change affects
//! eligibility, unless an update is already waiting for a reboot.
//!
//! ## Features
//!
//! - Canonicalize legacy channel names (`stable-2021` -> `stable6`)
//! - Persist settings in the device-protected storage domain, readable before unlock
//! - Build-time defaults from an embedded INI document
//! - Gate scheduler triggers on the reboot-pending marker
//! - Restrict sessions to the system user
//! - Resolve the cached changelog to a read-only view request
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use updater_settings::{
//!     AccessGuard, BuildDefaults, ChangelogLocator, ExecutionContext, MemoryBackend,
//!     RebootControl, Scheduler, SessionServices, SettingsSession, SettingsStore, UserId,
//! };
//!
//! #[derive(Default)]
//! struct Jobs(Mutex<Vec<bool>>);
//! impl Scheduler for Jobs {
//!     fn schedule(&self, immediate: bool) {
//!         self.0.lock().unwrap().push(immediate);
//!     }
//! }
//! struct IdleReboot;
//! impl RebootControl for IdleReboot {
//!     fn cancel(&self) {}
//! }
//!
//! let jobs = Arc::new(Jobs::default());
//! let store = SettingsStore::new(Arc::new(MemoryBackend::new()), BuildDefaults::builtin()?);
//! let guarded = AccessGuard::default().verify(&ExecutionContext::new(UserId::SYSTEM))?;
//! let mut session = SettingsSession::start(
//!     guarded,
//!     SessionServices {
//!         store: store.clone(),
//!         scheduler: jobs.clone(),
//!         reboot: Arc::new(IdleReboot),
//!         changelog: ChangelogLocator::new("/nonexistent/cache"),
//!     },
//! )?;
//!
//! session.on_battery_not_low_changed(true);
//! assert_eq!(*jobs.0.lock().unwrap(), vec![false]);
//!
//! // Once an update is staged, edits no longer schedule checks
//! store.set_waiting_for_reboot(true);
//! session.on_check_for_updates();
//! assert_eq!(jobs.0.lock().unwrap().len(), 1);
//! # Ok::<(), updater_settings::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Fallible functions return [`Result<T, Error>`]. A failed access check is
//! [`Error::SecurityViolation`] and must be treated as fatal.

// Re-export all public types at crate root
pub use types::{NetworkType, SettingKey, SettingValue, Snapshot, ValueKind};

// Re-export error types
pub use error::{Error, Result};

pub use access::{AccessGuard, ExecutionContext, Guarded, UserId};
pub use backend::{FileBackend, MemoryBackend, StorageBackend, StorageDomain};
pub use changelog::{
    ChangelogLocator, ContentUri, UriGrant, ViewAction, ViewCategory, ViewRequest,
    CURRENT_CHANGELOG,
};
pub use channel::{canonicalize, ChannelFamily};
pub use defaults::BuildDefaults;
pub use gate::{EligibilityGate, GateDecision, RebootControl, Scheduler};
pub use query::query_settings;
pub use session::{
    ChangelogOutcome, DisplayState, SessionServices, SessionState, SettingsSession,
    CHANGELOG_SUMMARY, CHANGELOG_UNAVAILABLE,
};
pub use store::SettingsStore;

// All modules are private - use re-exports above for public API
mod access;
mod backend;
mod changelog;
mod channel;
mod defaults;
mod error;
mod gate;
mod query;
mod session;
mod store;
mod types;
