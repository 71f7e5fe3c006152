//! Frame-budget quality control and allocation-free entity recycling for a
//! per-frame host loop.

pub mod config;
pub mod controller;
pub mod pool;
pub mod preference;
pub mod settings;
pub mod tier;
pub mod time;

pub use config::ControllerConfig;
pub use controller::{AdaptiveQualityController, SubscriptionId};
pub use pool::{EntityPool, PoolHandle, PoolStats};
pub use settings::{QualityPresets, QualitySettings};
pub use tier::QualityTier;
