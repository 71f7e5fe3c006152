//! Per-tier settings bundles.
//!
//! Every value here is fixed at startup. The only input is the device pixel
//! ratio, which the host queries once and hands to [`QualityPresets::new`] so
//! the Ultra row can use the display's native density.

use crate::tier::QualityTier;
use serde::Serialize;

const MAX_DEVICE_PIXEL_RATIO: f32 = 3.0;

/// Rendering and world-population parameters for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualitySettings {
    pub shadow_map_size: u32,
    pub shadows: bool,
    pub antialias: bool,
    pub max_pixel_ratio: f32,
    pub grass_count: u32,
    pub tree_count: u32,
    pub rock_count: u32,
    pub fog: bool,
    pub particles: bool,
    pub particle_count: u32,
    /// Scales `particle_count`; always in (0, 1].
    pub particle_multiplier: f32,
    /// Chunk radius around the camera.
    pub view_distance: u32,
    /// Vertices per terrain chunk edge.
    pub terrain_resolution: u32,
}

impl QualitySettings {
    /// Particles the host should keep alive at this tier.
    pub fn effective_particle_count(&self) -> u32 {
        if !self.particles {
            return 0;
        }
        (self.particle_count as f32 * self.particle_multiplier).round() as u32
    }
}

const LOW: QualitySettings = QualitySettings {
    shadow_map_size: 512,
    shadows: false,
    antialias: false,
    max_pixel_ratio: 1.0,
    grass_count: 2000,
    tree_count: 40,
    rock_count: 30,
    fog: false,
    particles: false,
    particle_count: 100,
    particle_multiplier: 0.25,
    view_distance: 1,
    terrain_resolution: 32,
};

const MEDIUM: QualitySettings = QualitySettings {
    shadow_map_size: 1024,
    shadows: true,
    antialias: false,
    max_pixel_ratio: 1.5,
    grass_count: 6000,
    tree_count: 120,
    rock_count: 80,
    fog: true,
    particles: true,
    particle_count: 300,
    particle_multiplier: 0.5,
    view_distance: 2,
    terrain_resolution: 48,
};

const HIGH: QualitySettings = QualitySettings {
    shadow_map_size: 2048,
    shadows: true,
    antialias: true,
    max_pixel_ratio: 2.0,
    grass_count: 12000,
    tree_count: 250,
    rock_count: 160,
    fog: true,
    particles: true,
    particle_count: 600,
    particle_multiplier: 0.75,
    view_distance: 3,
    terrain_resolution: 64,
};

/// Ultra without its pixel ratio, which comes from the device.
const ULTRA_BASE: QualitySettings = QualitySettings {
    shadow_map_size: 4096,
    shadows: true,
    antialias: true,
    max_pixel_ratio: 2.0,
    grass_count: 20000,
    tree_count: 400,
    rock_count: 260,
    fog: true,
    particles: true,
    particle_count: 1000,
    particle_multiplier: 1.0,
    view_distance: 4,
    terrain_resolution: 96,
};

/// Settings for all four tiers, indexed by [`QualityTier::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct QualityPresets {
    table: [QualitySettings; 4],
}

impl QualityPresets {
    /// Build the table, baking `device_pixel_ratio` into the Ultra row.
    pub fn new(device_pixel_ratio: f32) -> Self {
        let ratio = if device_pixel_ratio.is_finite() {
            device_pixel_ratio.clamp(1.0, MAX_DEVICE_PIXEL_RATIO)
        } else {
            log::warn!("Non-finite device pixel ratio {device_pixel_ratio}, using 1.0");
            1.0
        };
        let ultra = QualitySettings {
            max_pixel_ratio: ratio,
            ..ULTRA_BASE
        };
        Self {
            table: [LOW, MEDIUM, HIGH, ultra],
        }
    }

    pub fn get(&self, tier: QualityTier) -> &QualitySettings {
        &self.table[tier.index()]
    }
}

impl Default for QualityPresets {
    fn default() -> Self {
        Self::new(2.0)
    }
}
