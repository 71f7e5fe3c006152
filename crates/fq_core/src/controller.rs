//! Adaptive quality: steps the render tier up or down from sustained frame pacing.
//!
//! The host loop calls [`AdaptiveQualityController::record_frame_time`] and
//! then [`AdaptiveQualityController::update_quality`] once per frame, and reads
//! [`AdaptiveQualityController::settings`] to populate the next frame.
//!
//! Two mechanisms keep the tier from flapping on transient spikes:
//!
//!   1. **Sample floor** -- no decision until `min_samples` FPS samples have
//!      accumulated since the last change (the buffer is cleared on change).
//!   2. **Cooldown** -- no decision within `cooldown_ms` of the last change.
//!
//! The downgrade and upgrade thresholds are separate, leaving a dead zone
//! between them where the tier holds. A change always moves exactly one tier.

use crate::config::{
    load_config_from_path, validate_config, ControllerConfig, MAX_SAMPLE_CAPACITY,
};
use crate::settings::{QualityPresets, QualitySettings};
use crate::tier::QualityTier;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Instant;

type ChangeCallback = Box<dyn FnMut(QualityTier, &QualitySettings)>;

/// Returned by [`AdaptiveQualityController::on_change`]; pass it to
/// [`AdaptiveQualityController::unsubscribe`] to stop notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct AdaptiveQualityController {
    config: ControllerConfig,
    presets: QualityPresets,
    current: QualityTier,
    fps_samples: VecDeque<f64>,
    last_change: Option<Instant>,
    subscribers: Vec<(SubscriptionId, ChangeCallback)>,
    next_subscription: u64,
}

impl AdaptiveQualityController {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// `config` must pass [`validate_config`]; debug builds assert it.
    pub fn with_config(config: ControllerConfig) -> Self {
        if let Err(err) = validate_config(&config) {
            if cfg!(debug_assertions) {
                panic!("{err}");
            }
            log::error!("Controller built from an invalid config: {err}");
        }
        let presets = QualityPresets::new(config.device_pixel_ratio);
        let preallocate = config.sample_capacity.min(MAX_SAMPLE_CAPACITY);
        Self {
            presets,
            current: config.initial_tier,
            fps_samples: VecDeque::with_capacity(preallocate),
            last_change: None,
            subscribers: Vec::new(),
            next_subscription: 0,
            config,
        }
    }

    pub fn from_config_path(path: &Path) -> Result<Self, String> {
        Ok(Self::with_config(load_config_from_path(path)?))
    }

    /// Feed the duration of the frame that just finished.
    pub fn record_frame_time(&mut self, delta_ms: f64) {
        if let Some(cutoff) = self.config.stall_cutoff_ms {
            if delta_ms > cutoff {
                log::debug!("Discarding {delta_ms:.1}ms frame as a stall (cutoff {cutoff}ms)");
                return;
            }
        }

        // NaN fails the comparison and is clamped as well.
        let delta_ms = if delta_ms >= self.config.min_frame_ms {
            delta_ms
        } else {
            self.config.min_frame_ms
        };

        while self.fps_samples.len() >= self.config.sample_capacity.max(1) {
            self.fps_samples.pop_front();
        }
        self.fps_samples.push_back(1000.0 / delta_ms);
    }

    pub fn update_quality(&mut self) -> bool {
        self.update_quality_at(Instant::now())
    }

    /// Same as [`update_quality`](Self::update_quality) with an explicit clock reading.
    pub fn update_quality_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_change {
            if now.saturating_duration_since(last) < self.config.cooldown() {
                return false;
            }
        }
        if self.fps_samples.len() < self.config.min_samples {
            return false;
        }
        let Some(avg_fps) = self.average_fps() else {
            return false;
        };

        let target = if avg_fps < self.config.downgrade_below_fps {
            self.current.step_down()
        } else if avg_fps > self.config.upgrade_above_fps {
            self.current.step_up()
        } else {
            None
        };

        match target {
            Some(tier) => {
                log::info!(
                    "Quality {} -> {} (avg {:.1} fps over {} samples)",
                    self.current,
                    tier,
                    avg_fps,
                    self.fps_samples.len()
                );
                self.apply_change(tier, now);
                true
            }
            None => false,
        }
    }

    pub fn settings(&self) -> QualitySettings {
        *self.presets.get(self.current)
    }

    pub fn level(&self) -> QualityTier {
        self.current
    }

    /// Force a tier, bypassing hysteresis. Restarts the cooldown.
    pub fn set_level(&mut self, tier: QualityTier) {
        self.set_level_at(tier, Instant::now());
    }

    pub fn set_level_at(&mut self, tier: QualityTier, now: Instant) {
        log::info!("Quality set to {} (was {})", tier, self.current);
        self.apply_change(tier, now);
    }

    /// Back to the configured initial tier with no samples and no cooldown.
    /// Subscribers stay registered and are not notified.
    pub fn reset(&mut self) {
        self.current = self.config.initial_tier;
        self.fps_samples.clear();
        self.last_change = None;
    }

    pub fn on_change<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(QualityTier, &QualitySettings) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Mean FPS over the buffered samples.
    pub fn average_fps(&self) -> Option<f64> {
        if self.fps_samples.is_empty() {
            return None;
        }
        Some(self.fps_samples.iter().sum::<f64>() / self.fps_samples.len() as f64)
    }

    pub fn sample_count(&self) -> usize {
        self.fps_samples.len()
    }

    pub fn presets(&self) -> &QualityPresets {
        &self.presets
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn apply_change(&mut self, tier: QualityTier, now: Instant) {
        self.current = tier;
        self.fps_samples.clear();
        self.last_change = Some(now);

        let settings = *self.presets.get(tier);
        for (_, callback) in &mut self.subscribers {
            callback(tier, &settings);
        }
    }
}

impl Default for AdaptiveQualityController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdaptiveQualityController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveQualityController")
            .field("current", &self.current)
            .field("samples", &self.fps_samples.len())
            .field("last_change", &self.last_change)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
