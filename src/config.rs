// src/config.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::window::{DateBounds, Preset};

pub const DEFAULT_STATS_CONFIG_PATH: &str = "config/stats.toml";
pub const ENV_STATS_CONFIG_PATH: &str = "MOOD_STATS_CONFIG_PATH";
pub const ENV_DEBOUNCE_MS: &str = "MOOD_STATS_DEBOUNCE_MS";
pub const ENV_DEFAULT_WINDOW: &str = "MOOD_STATS_DEFAULT_WINDOW";

fn default_window() -> Preset {
    Preset::LastWeek
}
fn default_min_custom_date() -> NaiveDate {
    DateBounds::default().min
}
fn default_max_custom_date() -> NaiveDate {
    DateBounds::default().max
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsConfig {
    /// Preset the selector starts in.
    #[serde(default = "default_window")]
    pub default_window: Preset,
    /// Quiet period after a source emission; newer emissions inside it win.
    #[serde(default)]
    pub recompute_debounce_ms: u64,
    /// JSON array of records loaded into the in-memory source at startup.
    #[serde(default)]
    pub seed_records_path: Option<PathBuf>,
    #[serde(default = "default_min_custom_date")]
    pub min_custom_date: NaiveDate,
    #[serde(default = "default_max_custom_date")]
    pub max_custom_date: NaiveDate,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            default_window: default_window(),
            recompute_debounce_ms: 0,
            seed_records_path: None,
            min_custom_date: default_min_custom_date(),
            max_custom_date: default_max_custom_date(),
        }
    }
}

impl StatsConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: StatsConfig = toml::from_str(s).context("parsing stats config")?;
        if cfg.min_custom_date > cfg.max_custom_date {
            anyhow::bail!(
                "min_custom_date {} is after max_custom_date {}",
                cfg.min_custom_date,
                cfg.max_custom_date
            );
        }
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading stats config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $MOOD_STATS_CONFIG_PATH (must exist)
    /// 2) config/stats.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_STATS_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_STATS_CONFIG_PATH} points to non-existent path");
            }
            Self::load_from(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_STATS_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from(&fallback)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Unparseable override values are ignored with a warning.
    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = env::var(ENV_DEBOUNCE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.recompute_debounce_ms = ms,
                Err(_) => tracing::warn!(target: "stats", value = %raw, "ignoring invalid {ENV_DEBOUNCE_MS}"),
            }
        }
        if let Ok(raw) = env::var(ENV_DEFAULT_WINDOW) {
            match raw.parse::<Preset>() {
                Ok(p) => self.default_window = p,
                Err(e) => tracing::warn!(target: "stats", error = %e, "ignoring {ENV_DEFAULT_WINDOW}"),
            }
        }
    }

    pub fn date_bounds(&self) -> DateBounds {
        DateBounds {
            min: self.min_custom_date,
            max: self.max_custom_date,
        }
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.recompute_debounce_ms)
    }
}
