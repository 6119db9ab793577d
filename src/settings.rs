use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::scroll::ScrollProximityDetector;
use crate::viewport::ViewportSampler;

const APP_SENTINEL: &str = "catalog-feed";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Where the price ordering is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPlacement {
    /// Sort is part of the query; changing it restarts the feed.
    #[default]
    Server,
    /// Sort only reorders what is already loaded.
    Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "_app")]
    pub app: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_item_height")]
    pub item_height: f64,

    #[serde(default = "default_threshold")]
    pub near_end_threshold: f64,

    /// Logical units per terminal column.
    #[serde(default = "default_cell_width")]
    pub cell_width: f64,

    /// Logical units per terminal row.
    #[serde(default = "default_cell_height")]
    pub cell_height: f64,

    #[serde(default)]
    pub sort_placement: SortPlacement,
}

fn default_item_height() -> f64 {
    ViewportSampler::DEFAULT_ITEM_HEIGHT
}

fn default_threshold() -> f64 {
    ScrollProximityDetector::DEFAULT_THRESHOLD
}

fn default_cell_width() -> f64 {
    10.0
}

fn default_cell_height() -> f64 {
    20.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: APP_SENTINEL.to_string(),
            api_url: None,
            item_height: default_item_height(),
            near_end_threshold: default_threshold(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            sort_placement: SortPlacement::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.app != APP_SENTINEL {
            bail!(
                "Settings file appears to belong to another application (expected _app = '{}', found '{}')",
                APP_SENTINEL,
                self.app
            );
        }
        for (name, value) in [
            ("item_height", self.item_height),
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
        ] {
            if !(value > 0.0) {
                bail!("{name} must be positive, found {value}");
            }
        }
        if self.near_end_threshold < 0.0 {
            bail!(
                "near_end_threshold must not be negative, found {}",
                self.near_end_threshold
            );
        }
        Ok(())
    }

    pub fn sampler(&self) -> ViewportSampler {
        ViewportSampler::new(self.item_height)
    }

    pub fn detector(&self) -> ScrollProximityDetector {
        ScrollProximityDetector::new(self.near_end_threshold)
    }
}

pub fn config_dir(custom: Option<&PathBuf>) -> Option<PathBuf> {
    custom
        .cloned()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config").join("catalog-feed")))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}

pub fn log_path(config_dir: &Path) -> PathBuf {
    config_dir.join("feed.log")
}
