use crate::tier::QualityTier;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Upper bound on `sample_capacity`; ten seconds of frames at 1000 fps.
pub const MAX_SAMPLE_CAPACITY: usize = 10_000;

/// Tunables for [`AdaptiveQualityController`](crate::controller::AdaptiveQualityController).
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Ring buffer size for FPS samples.
    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: usize,
    /// Samples needed before a decision is considered.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Minimum gap between two tier changes.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_downgrade_below_fps")]
    pub downgrade_below_fps: f64,
    #[serde(default = "default_upgrade_above_fps")]
    pub upgrade_above_fps: f64,
    /// Lower clamp for frame deltas before converting to FPS.
    #[serde(default = "default_min_frame_ms")]
    pub min_frame_ms: f64,
    /// Deltas above this are treated as stalls and left out of the average.
    /// `null` keeps every sample.
    #[serde(default = "default_stall_cutoff_ms")]
    pub stall_cutoff_ms: Option<f64>,
    #[serde(default)]
    pub initial_tier: QualityTier,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f32,
}

impl ControllerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sample_capacity: default_sample_capacity(),
            min_samples: default_min_samples(),
            cooldown_ms: default_cooldown_ms(),
            downgrade_below_fps: default_downgrade_below_fps(),
            upgrade_above_fps: default_upgrade_above_fps(),
            min_frame_ms: default_min_frame_ms(),
            stall_cutoff_ms: default_stall_cutoff_ms(),
            initial_tier: QualityTier::default(),
            device_pixel_ratio: default_device_pixel_ratio(),
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<ControllerConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    parse_config(&raw).map_err(|e| format!("{e} ({})", path.display()))
}

pub fn parse_config(raw: &str) -> Result<ControllerConfig, String> {
    let config: ControllerConfig = serde_json::from_str(raw)
        .map_err(|e| format!("Failed to parse controller config JSON: {e}"))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ControllerConfig) -> Result<(), String> {
    if config.min_samples == 0 {
        return Err("Config validation failed: min_samples must be > 0".to_string());
    }
    if config.sample_capacity > MAX_SAMPLE_CAPACITY {
        return Err(format!(
            "Config validation failed: sample_capacity ({}) exceeds {}",
            config.sample_capacity, MAX_SAMPLE_CAPACITY
        ));
    }
    if config.sample_capacity < config.min_samples {
        return Err(format!(
            "Config validation failed: sample_capacity ({}) is smaller than min_samples ({})",
            config.sample_capacity, config.min_samples
        ));
    }
    if !(config.min_frame_ms.is_finite() && config.min_frame_ms > 0.0) {
        return Err("Config validation failed: min_frame_ms must be > 0".to_string());
    }
    if !(config.downgrade_below_fps.is_finite() && config.upgrade_above_fps.is_finite()) {
        return Err("Config validation failed: FPS thresholds must be finite".to_string());
    }
    if config.downgrade_below_fps >= config.upgrade_above_fps {
        return Err(format!(
            "Config validation failed: downgrade_below_fps ({}) must be below upgrade_above_fps ({})",
            config.downgrade_below_fps, config.upgrade_above_fps
        ));
    }
    if let Some(cutoff) = config.stall_cutoff_ms {
        if !(cutoff.is_finite() && cutoff > config.min_frame_ms) {
            return Err(format!(
                "Config validation failed: stall_cutoff_ms ({cutoff}) must exceed min_frame_ms"
            ));
        }
    }
    Ok(())
}

const fn default_sample_capacity() -> usize {
    60
}

const fn default_min_samples() -> usize {
    30
}

const fn default_cooldown_ms() -> u64 {
    3000
}

const fn default_downgrade_below_fps() -> f64 {
    25.0
}

const fn default_upgrade_above_fps() -> f64 {
    55.0
}

const fn default_min_frame_ms() -> f64 {
    1.0
}

const fn default_stall_cutoff_ms() -> Option<f64> {
    Some(1000.0)
}

const fn default_device_pixel_ratio() -> f32 {
    2.0
}
