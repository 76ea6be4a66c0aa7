//! TOML configuration for the fill engine
//!
//! Every key is optional:
//!
//! ```toml
//! template_path = "assets/dqf-packet.pdf"
//! drafts_dir = ".dqf/drafts"
//! autosave_delay_ms = 750
//! generation_timeout_ms = 30000
//! default_scale = 1.0
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillConfig {
    /// Blank packet template (default: assets/dqf-packet.pdf)
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    /// Custom JSON registry; the built-in packet table when absent
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
    /// Directory for per-applicant drafts (default: .dqf/drafts)
    #[serde(default = "default_drafts_dir")]
    pub drafts_dir: PathBuf,
    /// Pause after the last edit before the draft is written (default: 750)
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
    /// Upper bound on one document generation (default: 30000)
    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,
    /// Viewport pixels per PDF point (default: 1.0)
    #[serde(default = "default_scale")]
    pub default_scale: f64,
}

fn default_template_path() -> PathBuf {
    PathBuf::from("assets/dqf-packet.pdf")
}

fn default_drafts_dir() -> PathBuf {
    PathBuf::from(".dqf/drafts")
}

fn default_autosave_delay_ms() -> u64 {
    750
}

fn default_generation_timeout_ms() -> u64 {
    30_000
}

fn default_scale() -> f64 {
    1.0
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            registry_path: None,
            drafts_dir: default_drafts_dir(),
            autosave_delay_ms: default_autosave_delay_ms(),
            generation_timeout_ms: default_generation_timeout_ms(),
            default_scale: default_scale(),
        }
    }
}

impl FillConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        anyhow::ensure!(
            config.default_scale.is_finite() && config.default_scale > 0.0,
            "default_scale must be positive, got {}",
            config.default_scale
        );
        Ok(config)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }
}
