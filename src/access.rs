//! Access guard
//!
//! Updater settings are device-wide, so only the system account may view or
//! change them. A failed check is a deployment error, not something to
//! retry: no session is ever constructed for another account.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Size of the uid range reserved for each user on multi-user devices
pub const PER_USER_RANGE: u32 = 100_000;

/// A device user (not a process uid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UserId(pub u32);

impl UserId {
    /// The primary/system user
    pub const SYSTEM: UserId = UserId(0);

    /// User owning a process uid
    pub fn from_uid(uid: u32) -> UserId {
        UserId(uid / PER_USER_RANGE)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {}", self.0)
    }
}

/// The account a session runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    pub user: UserId,
}

impl ExecutionContext {
    pub fn new(user: UserId) -> Self {
        Self { user }
    }

    /// Context of the running process
    pub fn current() -> Self {
        let uid = nix::unistd::Uid::current().as_raw();
        Self::new(UserId::from_uid(uid))
    }
}

/// Proof that the access check passed
///
/// Only [`AccessGuard::verify`] can produce one, and starting a session
/// requires it.
#[derive(Debug)]
pub struct Guarded {
    context: ExecutionContext,
}

impl Guarded {
    pub fn context(&self) -> ExecutionContext {
        self.context
    }
}

/// Restricts settings access to one privileged account
#[derive(Debug, Clone, Copy)]
pub struct AccessGuard {
    privileged: UserId,
}

impl Default for AccessGuard {
    fn default() -> Self {
        Self::new(UserId::SYSTEM)
    }
}

impl AccessGuard {
    pub fn new(privileged: UserId) -> Self {
        Self { privileged }
    }

    pub fn verify(&self, context: &ExecutionContext) -> Result<Guarded> {
        if context.user != self.privileged {
            log::error!(
                "Refusing settings access for {} (only {} allowed)",
                context.user,
                self.privileged
            );
            return Err(Error::SecurityViolation(format!(
                "{} only, running as {}",
                self.privileged, context.user
            )));
        }
        Ok(Guarded { context: *context })
    }
}
