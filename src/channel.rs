//! Release channel identifiers
//!
//! Channel names have changed format over time. Every read of the channel
//! setting goes through [`canonicalize`] so that a value persisted by an
//! older build resolves to the identifier the current build understands.
//!
//! # Example
//!
//! ```rust
//! use updater_settings::{canonicalize, ChannelFamily};
//!
//! assert_eq!(canonicalize("stable-2021"), "stable6");
//! assert_eq!(canonicalize("nightly"), "nightly");
//! assert_eq!(ChannelFamily::of("beta6"), Some(ChannelFamily::Beta));
//! ```

use serde::Serialize;

/// A family of release channels sharing a legacy prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelFamily {
    SecurityExpress,
    Stable,
    Beta,
}

impl ChannelFamily {
    /// Families in match priority order.
    ///
    /// `security-express` must come before the generic families so a more
    /// specific prefix is never shadowed.
    pub const PRIORITY: [ChannelFamily; 3] = [
        ChannelFamily::SecurityExpress,
        ChannelFamily::Stable,
        ChannelFamily::Beta,
    ];

    /// Legacy prefix identifying this family
    pub fn prefix(self) -> &'static str {
        match self {
            ChannelFamily::SecurityExpress => "security-express",
            ChannelFamily::Stable => "stable",
            ChannelFamily::Beta => "beta",
        }
    }

    /// Canonical identifier for the current schema generation
    pub fn canonical(self) -> &'static str {
        match self {
            ChannelFamily::SecurityExpress => "security-express6",
            ChannelFamily::Stable => "stable6",
            ChannelFamily::Beta => "beta6",
        }
    }

    /// Human-readable label shown as the channel summary
    pub fn label(self) -> &'static str {
        match self {
            ChannelFamily::SecurityExpress => "Security express",
            ChannelFamily::Stable => "Stable",
            ChannelFamily::Beta => "Beta",
        }
    }

    /// Find the family of a channel identifier, legacy or canonical
    pub fn of(channel: &str) -> Option<ChannelFamily> {
        Self::PRIORITY
            .into_iter()
            .find(|family| channel.starts_with(family.prefix()))
    }
}

/// Map a raw channel identifier to its canonical form
///
/// The first family whose prefix matches wins; anything after the prefix is
/// discarded. Unrecognized identifiers pass through unchanged so channels
/// added after this build was made keep working. The function is total and
/// idempotent.
pub fn canonicalize(raw: &str) -> String {
    match ChannelFamily::of(raw) {
        Some(family) => family.canonical().to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_prefixes_migrate() {
        assert_eq!(canonicalize("stable-2021"), "stable6");
        assert_eq!(canonicalize("stable"), "stable6");
        assert_eq!(canonicalize("beta"), "beta6");
        assert_eq!(canonicalize("beta4"), "beta6");
        assert_eq!(canonicalize("security-express"), "security-express6");
        assert_eq!(canonicalize("security-express-legacy"), "security-express6");
    }

    #[test]
    fn test_unrecognized_passes_through() {
        assert_eq!(canonicalize("nightly"), "nightly");
        assert_eq!(canonicalize(""), "");
        // Prefix match is case sensitive
        assert_eq!(canonicalize("Stable"), "Stable");
        assert_eq!(canonicalize("x-stable"), "x-stable");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "stable",
            "stable6",
            "stable-2021",
            "beta",
            "beta6",
            "security-express",
            "security-express6",
            "nightly",
            "",
            "alpha-7",
        ];
        for raw in inputs {
            let once = canonicalize(raw);
            assert_eq!(canonicalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_family_lookup() {
        assert_eq!(
            ChannelFamily::of("security-express6"),
            Some(ChannelFamily::SecurityExpress)
        );
        assert_eq!(ChannelFamily::of("stable6"), Some(ChannelFamily::Stable));
        assert_eq!(ChannelFamily::of("beta"), Some(ChannelFamily::Beta));
        assert_eq!(ChannelFamily::of("nightly"), None);
        assert_eq!(ChannelFamily::Stable.label(), "Stable");
    }

    #[test]
    fn test_priority_keeps_canonicals_in_their_family() {
        for family in ChannelFamily::PRIORITY {
            assert_eq!(ChannelFamily::of(family.canonical()), Some(family));
        }
    }
}
