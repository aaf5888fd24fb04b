//! Process-level run configuration.
//!
//! Callers usually pass an explicit diagnostics level; this fallback exists
//! for embeddings that configure through the environment (a `.env` file is
//! honored when present).

use crate::types::DiagnosticsLevel;

/// Environment variable consulted when no explicit level is given.
/// Accepted values: `false`, `top`, `true` (plus `off`/`full` aliases).
pub const DIAGNOSTICS_ENV_VAR: &str = "LOOMBOARD_DIAGNOSTICS";

/// Defaults applied when the caller leaves a knob unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub diagnostics: DiagnosticsLevel,
}

impl RunConfig {
    /// Resolve from the process environment. Unset or unparseable values
    /// fall back to diagnostics off.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let diagnostics = std::env::var(DIAGNOSTICS_ENV_VAR)
            .ok()
            .and_then(|v| DiagnosticsLevel::decode(&v))
            .unwrap_or_default();
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_diagnostics_off() {
        assert_eq!(RunConfig::default().diagnostics, DiagnosticsLevel::Off);
    }
}
