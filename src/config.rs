//! Engine configuration.
//!
//! Loaded from `~/.applyflow/config.json` when present, otherwise defaults.
//! Every field has a default so a partial config file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration consumed by the engine and the pacing controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pacing profile name: `conservative`, `moderate`, or `aggressive`.
    pub pacing_profile: String,
    /// Applications permitted per day before `Throttled`.
    pub max_applications_per_session: u32,
    /// Length of the rolling action window in minutes.
    pub session_window_minutes: u32,
    /// Gated actions permitted per rolling window.
    pub actions_per_window: u32,
    /// Minimum fuzzy-match confidence for catalog field matching.
    pub fuzzy_threshold: f32,
    /// Minimum confidence for accepting a synthesized custom-question answer.
    pub synthesis_threshold: f32,
    /// Maximum wizard pages per attempt before bailing to manual review.
    pub max_steps: u32,
    /// Timeout for every navigation/settle wait, in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Bounded wait for a submission success signal, in milliseconds.
    pub submit_confirm_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pacing_profile: "moderate".to_string(),
            max_applications_per_session: 50,
            session_window_minutes: 60,
            actions_per_window: 300,
            fuzzy_threshold: 0.5,
            synthesis_threshold: 0.30,
            max_steps: 8,
            navigation_timeout_ms: 30_000,
            submit_confirm_timeout_ms: 15_000,
        }
    }
}

impl EngineConfig {
    /// Load the config file from the default location, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(config)
    }
}

/// The applyflow data directory: `~/.applyflow`.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".applyflow")
}

/// Path of the config file: `~/.applyflow/config.json`.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.pacing_profile, "moderate");
        assert_eq!(config.max_applications_per_session, 50);
        assert_eq!(config.max_steps, 8);
    }

    #[test]
    fn test_partial_config_parses() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"pacing_profile": "conservative"}"#).unwrap();
        assert_eq!(config.pacing_profile, "conservative");
        assert_eq!(config.session_window_minutes, 60);
    }
}
