//! Solver configuration
//!
//! Sources, highest priority first:
//! 1. Environment variables (`EQSOLVE_*`)
//! 2. A configuration file (`EQSOLVE_CONFIG`, or `eqsolve.toml` /
//!    `.eqsolve.yaml` / `.eqsolve.json` in the current directory)
//! 3. Built-in defaults

use crate::error::SolverError;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_MAX_STEPS: usize = 10_000;

/// Search and simplification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum number of reduction steps before giving up (None = unbounded)
    #[serde(default = "default_max_steps")]
    pub max_steps: Option<usize>,
    /// Check solved systems against the original equations
    #[serde(default = "default_true")]
    pub verify_solutions: bool,
    /// Normalizer rounds per simplification
    #[serde(default = "default_simplify_rounds")]
    pub max_simplify_rounds: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            verify_solutions: true,
            max_simplify_rounds: default_simplify_rounds(),
        }
    }
}

fn default_max_steps() -> Option<usize> {
    Some(DEFAULT_MAX_STEPS)
}

fn default_true() -> bool {
    true
}

fn default_simplify_rounds() -> usize {
    eqsolve_symbolic::DEFAULT_SIMPLIFY_ROUNDS
}

impl SolverConfig {
    /// Explore every branch, however long it takes
    pub fn exhaustive() -> Self {
        Self {
            max_steps: None,
            ..Default::default()
        }
    }

    /// Give up after `steps` reduction steps
    pub fn bounded(steps: usize) -> Self {
        Self {
            max_steps: Some(steps),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.max_steps == Some(0) {
            return Err(SolverError::InvalidConfig(
                "max_steps must be positive (omit it for unbounded search)".to_string(),
            ));
        }
        if self.max_simplify_rounds == 0 {
            return Err(SolverError::InvalidConfig(
                "max_simplify_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<SolverConfig> {
        let mut config = Self::load_from_files()?;
        Self::apply_environment_variables(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn load_from_files() -> Result<SolverConfig> {
        for path in Self::find_config_files() {
            if path.is_file() {
                info!("Loading solver configuration from: {}", path.display());
                return Self::load_from_file(&path);
            }
        }

        debug!("No solver configuration file found, using defaults");
        Ok(SolverConfig::default())
    }

    fn find_config_files() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(config_path) = env::var("EQSOLVE_CONFIG") {
            paths.push(PathBuf::from(config_path));
        }

        if let Ok(current_dir) = env::current_dir() {
            for name in [
                "eqsolve.toml",
                ".eqsolve.toml",
                ".eqsolve.yaml",
                ".eqsolve.yml",
                ".eqsolve.json",
            ] {
                paths.push(current_dir.join(name));
            }
        }

        paths
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<SolverConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            _ => {
                if let Ok(config) = toml::from_str(&content) {
                    config
                } else if let Ok(config) = serde_yaml::from_str(&content) {
                    config
                } else if let Ok(config) = serde_json::from_str(&content) {
                    config
                } else {
                    return Err(anyhow::anyhow!(
                        "Could not parse config file {} (tried TOML, YAML, JSON)",
                        path.display()
                    ));
                }
            }
        };

        Ok(config)
    }

    /// Save configuration to a file, format chosen by extension
    pub fn save_to_file(config: &SolverConfig, path: &Path) -> Result<()> {
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)
                .context("Failed to serialize config to JSON")?,
            Some("yaml") | Some("yml") => {
                serde_yaml::to_string(config).context("Failed to serialize config to YAML")?
            }
            _ => toml::to_string_pretty(config).context("Failed to serialize config to TOML")?,
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_environment_variables(config: &mut SolverConfig) -> Result<()> {
        if let Ok(steps) = env::var("EQSOLVE_MAX_STEPS") {
            config.max_steps = match steps.trim().to_ascii_lowercase().as_str() {
                "" | "none" | "unbounded" => None,
                other => Some(
                    other
                        .parse()
                        .with_context(|| format!("Invalid EQSOLVE_MAX_STEPS: {}", steps))?,
                ),
            };
        }

        if let Some(flag) = env::var("EQSOLVE_VERIFY").ok().and_then(|v| parse_bool(&v)) {
            config.verify_solutions = flag;
        }

        if let Ok(rounds) = env::var("EQSOLVE_SIMPLIFY_ROUNDS") {
            if let Ok(rounds) = rounds.trim().parse() {
                config.max_simplify_rounds = rounds;
            }
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enable" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disable" | "disabled" => Some(false),
        "" => Some(false),
        _ => None,
    }
}
