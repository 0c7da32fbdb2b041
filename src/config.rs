use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::physics::PhysicsConfig;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub physics: PhysicsConfig,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub toast_ttl_ms: u64,
    pub discovery_interval_ms: u64,
    /// Provider calls per discovery run.
    pub discovery_rounds: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            viewport_width: 1280.0,
            viewport_height: 800.0,
            toast_ttl_ms: 4_000,
            discovery_interval_ms: 1_500,
            discovery_rounds: 6,
        }
    }
}

impl ExplorerConfig {
    /// Reads a JSON config. Missing fields fall back to defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn toast_ttl_secs(&self) -> f64 {
        self.toast_ttl_ms as f64 / 1_000.0
    }
}
