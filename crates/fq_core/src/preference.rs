//! Persisted user quality choice.
//!
//! A small versioned JSON document. A version mismatch is a load error so
//! stale files from older builds are ignored rather than half-applied; the
//! host falls back to adaptive defaults.

use crate::controller::AdaptiveQualityController;
use crate::tier::QualityTier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;

pub const PREFERENCE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPreference {
    pub version: u32,
    pub tier: QualityTier,
    /// When false the host should stop calling `update_quality`.
    #[serde(default = "default_auto_adjust")]
    pub auto_adjust: bool,
}

impl QualityPreference {
    pub fn new(tier: QualityTier, auto_adjust: bool) -> Self {
        Self {
            version: PREFERENCE_VERSION,
            tier,
            auto_adjust,
        }
    }

    /// Force the stored tier on `controller`. Returns whether adaptive
    /// adjustment should stay on.
    pub fn apply(&self, controller: &mut AdaptiveQualityController) -> bool {
        self.apply_at(controller, Instant::now())
    }

    /// Same as [`apply`](Self::apply), starting the cooldown at `now`.
    pub fn apply_at(&self, controller: &mut AdaptiveQualityController, now: Instant) -> bool {
        controller.set_level_at(self.tier, now);
        self.auto_adjust
    }
}

pub fn load_preference_from_path(path: &Path) -> Result<QualityPreference, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let pref: QualityPreference = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse preference JSON {}: {e}", path.display()))?;
    validate_preference(&pref)?;
    Ok(pref)
}

pub fn save_preference_to_path(pref: &QualityPreference, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(pref)
        .map_err(|e| format!("Failed to serialize preference: {e}"))?;
    fs::write(path, json).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

fn validate_preference(pref: &QualityPreference) -> Result<(), String> {
    if pref.version != PREFERENCE_VERSION {
        return Err(format!(
            "Preference validation failed: version {} is not supported (expected {})",
            pref.version, PREFERENCE_VERSION
        ));
    }
    Ok(())
}

const fn default_auto_adjust() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "fq_pref_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn save_then_load_keeps_choice() {
        let path = temp_file_path("save");
        let pref = QualityPreference::new(QualityTier::High, false);
        save_preference_to_path(&pref, &path).expect("preference should save");

        let loaded = load_preference_from_path(&path).expect("preference should load");
        assert_eq!(loaded, pref);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn auto_adjust_defaults_on() {
        let path = temp_file_path("default");
        fs::write(&path, r#"{ "version": 1, "tier": "low" }"#).expect("write preference");

        let loaded = load_preference_from_path(&path).expect("preference should load");
        assert_eq!(loaded.tier, QualityTier::Low);
        assert!(loaded.auto_adjust);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let path = temp_file_path("version");
        fs::write(&path, r#"{ "version": 7, "tier": "ultra" }"#).expect("write preference");

        let err = load_preference_from_path(&path).expect_err("version 7 must fail");
        assert!(err.contains("version 7"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_tier_is_a_parse_error() {
        let path = temp_file_path("tier");
        fs::write(&path, r#"{ "version": 1, "tier": "cinematic" }"#).expect("write preference");

        let err = load_preference_from_path(&path).expect_err("unknown tier must fail");
        assert!(err.contains("Failed to parse"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn apply_forces_tier_on_controller() {
        let mut controller = AdaptiveQualityController::new();
        let keep_adaptive = QualityPreference::new(QualityTier::Ultra, false).apply(&mut controller);
        assert!(!keep_adaptive);
        assert_eq!(controller.level(), QualityTier::Ultra);
    }

    #[test]
    fn apply_at_starts_cooldown_on_given_clock() {
        let mut controller = AdaptiveQualityController::new();
        let start = Instant::now();
        QualityPreference::new(QualityTier::High, true).apply_at(&mut controller, start);
        for _ in 0..60 {
            controller.record_frame_time(10.0);
        }

        let cooldown = controller.config().cooldown();
        assert!(!controller.update_quality_at(start + cooldown - Duration::from_millis(1)));
        assert_eq!(controller.level(), QualityTier::High);
        assert!(controller.update_quality_at(start + cooldown));
        assert_eq!(controller.level(), QualityTier::Ultra);
    }
}
