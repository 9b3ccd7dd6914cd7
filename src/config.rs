use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Capture routing rules. A parameter whose path contains one of the
/// excluded owner names is never captured into any pose, neutral or not:
/// capturing into only one layer would break the restoration guarantee.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureRules {
    #[serde(default = "CaptureRules::default_excluded_owners")]
    pub excluded_owners: Vec<String>,
}

impl CaptureRules {
    fn default_excluded_owners() -> Vec<String> {
        vec!["Materials".to_string()]
    }

    pub fn allows(&self, segments: &[String]) -> bool {
        !segments.iter().any(|s| self.excluded_owners.iter().any(|owner| owner == s))
    }
}

impl Default for CaptureRules {
    fn default() -> Self {
        Self { excluded_owners: Self::default_excluded_owners() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Whole interpolation steps per transition.
    #[serde(default = "EngineConfig::default_lerp_steps")]
    pub lerp_steps: usize,
    /// Seconds between steps.
    #[serde(default = "EngineConfig::default_lerp_interval")]
    pub lerp_interval: f32,
    #[serde(default)]
    pub undo_limit: Option<usize>,
    #[serde(default)]
    pub capture: CaptureRules,
}

impl EngineConfig {
    const fn default_lerp_steps() -> usize {
        25
    }

    const fn default_lerp_interval() -> f32 {
        0.02
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading engine config {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&text)
            .with_context(|| format!("Parsing engine config {}", path.display()))?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lerp_steps: Self::default_lerp_steps(),
            lerp_interval: Self::default_lerp_interval(),
            undo_limit: None,
            capture: CaptureRules::default(),
        }
    }
}
