//! Configuration
//!
//! Run parameters, loaded from a TOML file or defaulted. Command-line flags
//! override individual fields after loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::DEFAULT_BELIEFS_FILE;
use crate::dialogue::ollama::{DEFAULT_HOST, DEFAULT_MODEL};
use crate::error::{Result, SimError};
use crate::topology::{Layout, LayoutKind};

/// Default config file path
pub const DEFAULT_CONFIG_PATH: &str = "belief_sim.toml";

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub layout: LayoutKind,
    /// Side length for grid layouts (agents = grid_size^2)
    pub grid_size: usize,
    /// Agent count for ring, mesh and star
    pub agents: usize,
    /// Persuader/defender exchanges per conversation
    pub rounds: u32,
    pub iterations: u32,
    pub beliefs_file: PathBuf,
    /// `None` makes the run non-reproducible; omitted in a file means `None`
    #[serde(default)]
    pub seed: Option<u64>,
    pub log_dir: PathBuf,
    pub backend: BackendConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Grid4,
            grid_size: 3,
            agents: 9,
            rounds: 5,
            iterations: 40,
            beliefs_file: PathBuf::from(DEFAULT_BELIEFS_FILE),
            seed: Some(42),
            log_dir: PathBuf::from("logs"),
            backend: BackendConfig::default(),
        }
    }
}

/// Chat backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub model: String,
    pub host: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            timeout_secs: 300,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimError::InvalidConfig(format!("could not read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SimError::InvalidConfig(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SimError::InvalidConfig(e.to_string()))
    }

    /// Builds the validated layout. Grid kinds use `grid_size`, the others `agents`.
    pub fn build_layout(&self) -> Result<Layout> {
        Layout::new(self.layout, self.agents, self.grid_size)
    }

    /// Checks everything that can be checked before a run starts.
    pub fn validate(&self) -> Result<()> {
        self.build_layout()?;
        if self.backend.timeout_secs == 0 {
            return Err(SimError::InvalidConfig(
                "backend timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Belief Simulation Configuration

# grid4, grid8, ring, mesh or star
layout = "grid4"
# grid layouts: agents = grid_size^2
grid_size = 3
# ring, mesh and star
agents = 9

rounds = 5
iterations = 40
beliefs_file = "money-philosophy.json"
# remove for a non-reproducible run
seed = 42
log_dir = "logs"

[backend]
model = "gemma3"
host = "http://localhost:11434"
timeout_secs = 300
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();

        assert_eq!(config.layout, LayoutKind::Grid4);
        assert_eq!(config.grid_size, 3);
        assert_eq!(config.rounds, 5);
        assert_eq!(config.iterations, 40);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.backend.model, "gemma3");
    }

    #[test]
    fn test_default_config_toml_parses() {
        let config = SimConfig::from_str(&default_config_toml()).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = SimConfig::from_str(
            r#"
            layout = "star"
            agents = 5

            [backend]
            model = "llama3"
        "#,
        )
        .unwrap();

        assert_eq!(config.layout, LayoutKind::Star);
        assert_eq!(config.agents, 5);
        assert_eq!(config.backend.model, "llama3");
        assert_eq!(config.backend.host, DEFAULT_HOST);
        assert_eq!(config.rounds, 5);
        assert_eq!(config.build_layout().unwrap(), Layout::Star { agents: 5 });
    }

    #[test]
    fn test_missing_seed_is_non_reproducible() {
        let config = SimConfig::from_str(
            r#"
            layout = "ring"
            agents = 6
            iterations = 5
        "#,
        )
        .unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(SimConfig::default().seed, Some(42));
    }

    #[test]
    fn test_unknown_layout_rejected() {
        let result = SimConfig::from_str(r#"layout = "hexagon""#);
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_star_fails_validation() {
        let config = SimConfig {
            layout: LayoutKind::Star,
            agents: 1,
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_to_toml_round_trip() {
        let config = SimConfig {
            layout: LayoutKind::Mesh,
            agents: 4,
            seed: None,
            ..SimConfig::default()
        };
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("layout = \"mesh\""));
        assert!(toml.contains("[backend]"));
        let parsed = SimConfig::from_str(&toml).unwrap();
        assert_eq!(parsed.layout, LayoutKind::Mesh);
        assert_eq!(parsed.seed, None);
    }
}
