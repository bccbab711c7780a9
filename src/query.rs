use crate::error::{Error, Result};
use crate::types::Snapshot;
use glob::Pattern;

/// Query a settings snapshot by glob patterns (OR logic)
/// Returns settings whose key matches any of the provided patterns
pub fn query_settings(snapshot: &Snapshot, patterns: &[&str]) -> Result<Snapshot> {
    // Compile all patterns first to fail fast on invalid patterns
    let compiled_patterns: Vec<Pattern> = patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::InvalidGlobPattern(format!("'{}': {}", p, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let queried: Snapshot = snapshot
        .iter()
        .filter(|(key, _)| compiled_patterns.iter().any(|pattern| pattern.matches(key)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(queried)
}
