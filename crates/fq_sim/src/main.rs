//! Headless host loop for the quality controller and entity pool.
//!
//! Replays a scripted frame-time trace on a virtual clock. Each frame:
//!
//!   1. `FrameClock::begin_frame_at()` -- measure the delta on the virtual clock
//!   2. `record_frame_time()` + `update_quality_at()` -- let the controller react
//!   3. `ParticleField::update()` -- spawn/expire particles against the tier budget
//!
//! Tier changes are collected through an `on_change` subscriber and printed,
//! with pool statistics, as a JSON summary at the end.

mod frame_script;
mod particles;

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use fq_core::preference::{load_preference_from_path, save_preference_to_path, QualityPreference};
use fq_core::time::FrameClock;
use fq_core::{AdaptiveQualityController, PoolStats, QualityTier};
use serde::Serialize;

use frame_script::{load_frame_script_from_path, FrameScript};
use particles::ParticleField;

const PARTICLE_POOL_SIZE: usize = 1024;
const PARTICLE_LIFETIME_MS: f32 = 1500.0;

#[derive(Debug, Default)]
struct Args {
    script: PathBuf,
    config: Option<PathBuf>,
    prefs: Option<PathBuf>,
    save_prefs: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct TierChange {
    frame: u64,
    tier: QualityTier,
}

#[derive(Debug, Serialize)]
struct SimSummary {
    script: Option<String>,
    frames: u64,
    simulated_ms: f64,
    final_tier: QualityTier,
    changes: Vec<TierChange>,
    peak_particles: usize,
    pool: PoolStats,
}

fn usage() -> String {
    "Usage: fq_sim <frame_script.json> [--config <controller.json>] [--prefs <prefs.json>] [--save-prefs <prefs.json>]".to_string()
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args::default();
    let mut script = None;
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "--prefs" | "--save-prefs" => {
                let value = iter
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| format!("Missing value for {arg}\n{}", usage()))?;
                match arg.as_str() {
                    "--config" => args.config = Some(value),
                    "--prefs" => args.prefs = Some(value),
                    _ => args.save_prefs = Some(value),
                }
            }
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown option '{flag}'\n{}", usage()));
            }
            path if script.is_none() => script = Some(PathBuf::from(path)),
            extra => return Err(format!("Unexpected argument '{extra}'\n{}", usage())),
        }
    }
    args.script = script.ok_or_else(usage)?;
    Ok(args)
}

/// Runs `script` on a virtual clock that begins at `start`.
fn run_simulation(
    script: &FrameScript,
    controller: &mut AdaptiveQualityController,
    auto_adjust: bool,
    start: Instant,
) -> SimSummary {
    let frame = Rc::new(Cell::new(0u64));
    let changes = Rc::new(RefCell::new(Vec::new()));
    let subscription = {
        let frame = Rc::clone(&frame);
        let changes = Rc::clone(&changes);
        controller.on_change(move |tier, settings| {
            log::info!(
                "Frame {}: tier {} (grass {}, particles {}, view distance {})",
                frame.get(),
                tier,
                settings.grass_count,
                settings.effective_particle_count(),
                settings.view_distance
            );
            changes.borrow_mut().push(TierChange {
                frame: frame.get(),
                tier,
            });
        })
    };

    let mut field = ParticleField::new(PARTICLE_POOL_SIZE, PARTICLE_LIFETIME_MS);
    field.prewarm(controller.settings().effective_particle_count() as usize);

    let mut clock = FrameClock::starting_at(start);
    let mut elapsed = Duration::ZERO;
    let mut peak_particles = 0;

    for frame_ms in script.expanded_frame_times() {
        let advanced = Duration::try_from_secs_f64(frame_ms / 1000.0)
            .ok()
            .and_then(|step| elapsed.checked_add(step))
            .and_then(|advanced| start.checked_add(advanced).map(|now| (advanced, now)));
        let Some((advanced, now)) = advanced else {
            log::warn!(
                "Frame {}: {frame_ms}ms does not fit the virtual clock, stopping",
                frame.get() + 1
            );
            break;
        };
        elapsed = advanced;
        frame.set(frame.get() + 1);

        let dt_ms = clock.begin_frame_at(now);
        controller.record_frame_time(dt_ms);
        if auto_adjust {
            controller.update_quality_at(now);
        }

        let budget = controller.settings().effective_particle_count();
        let stats = field.update(dt_ms, budget);
        if stats.culled > 0 {
            log::debug!("Frame {}: culled {} particles", frame.get(), stats.culled);
        }
        log::trace!(
            "Frame {}: {:.2}ms, +{} -{} particles",
            frame.get(),
            dt_ms,
            stats.spawned,
            stats.expired
        );
        peak_particles = peak_particles.max(field.active());
    }

    log::info!(
        "Simulated {} frames, smoothed {:.1} fps at end",
        clock.frame_count,
        clock.smoothed_fps
    );
    controller.unsubscribe(subscription);

    let changes = changes.borrow().clone();
    SimSummary {
        script: script.name.clone(),
        frames: clock.frame_count,
        simulated_ms: elapsed.as_secs_f64() * 1000.0,
        final_tier: controller.level(),
        changes,
        peak_particles,
        pool: field.pool_stats(),
    }
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;

    let script = load_frame_script_from_path(&args.script)?;
    log::info!(
        "Loaded frame script '{}': {} segments, {:.0}ms",
        script.name.as_deref().unwrap_or("unnamed"),
        script.segments.len(),
        script.total_ms()
    );

    let mut controller = match &args.config {
        Some(path) => AdaptiveQualityController::from_config_path(path)?,
        None => AdaptiveQualityController::new(),
    };

    let start = Instant::now();
    let mut auto_adjust = true;
    if let Some(path) = &args.prefs {
        match load_preference_from_path(path) {
            Ok(pref) => {
                auto_adjust = pref.apply_at(&mut controller, start);
                log::info!(
                    "Applied saved preference: {} (auto adjust {})",
                    pref.tier,
                    auto_adjust
                );
            }
            Err(err) => log::warn!("Ignoring saved preference: {err}"),
        }
    }

    let summary = run_simulation(&script, &mut controller, auto_adjust, start);

    if let Some(path) = &args.save_prefs {
        let pref = QualityPreference::new(summary.final_tier, auto_adjust);
        save_preference_to_path(&pref, path)?;
        log::info!("Saved preference to {}", path.display());
    }

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| format!("Failed to serialize summary: {e}"))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_script::FrameSegment;

    fn script(segments: &[(f64, u32)]) -> FrameScript {
        FrameScript {
            name: Some("test".to_string()),
            segments: segments
                .iter()
                .map(|&(frame_ms, repeat)| FrameSegment { frame_ms, repeat })
                .collect(),
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_script_and_options() {
        let args = parse_args(&strings(&["trace.json", "--config", "c.json", "--prefs", "p.json"]))
            .expect("args should parse");
        assert_eq!(args.script, PathBuf::from("trace.json"));
        assert_eq!(args.config, Some(PathBuf::from("c.json")));
        assert_eq!(args.prefs, Some(PathBuf::from("p.json")));
        assert_eq!(args.save_prefs, None);
    }

    #[test]
    fn rejects_missing_script_and_unknown_flags() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&strings(&["trace.json", "--verbose"])).is_err());
        assert!(parse_args(&strings(&["trace.json", "--config"])).is_err());
        assert!(parse_args(&strings(&["a.json", "b.json"])).is_err());
    }

    #[test]
    fn sustained_slow_frames_walk_down_to_low() {
        let mut controller = AdaptiveQualityController::new();
        // 20 fps for 10 seconds.
        let summary = run_simulation(
            &script(&[(50.0, 200)]),
            &mut controller,
            true,
            Instant::now(),
        );
        assert_eq!(summary.final_tier, QualityTier::Low);
        assert_eq!(summary.changes.len(), 1);
        assert_eq!(summary.changes[0].tier, QualityTier::Low);
        assert_eq!(summary.frames, 200);
    }

    #[test]
    fn fast_frames_climb_one_tier_per_cooldown() {
        let mut controller = AdaptiveQualityController::new();
        // 100 fps for 10 seconds.
        let summary = run_simulation(
            &script(&[(10.0, 1000)]),
            &mut controller,
            true,
            Instant::now(),
        );
        let tiers: Vec<_> = summary.changes.iter().map(|c| c.tier).collect();
        assert_eq!(tiers, vec![QualityTier::High, QualityTier::Ultra]);
        assert!(summary.changes[1].frame - summary.changes[0].frame >= 300);
        assert_eq!(summary.peak_particles, 1000);
    }

    #[test]
    fn single_spike_does_not_change_tier() {
        let mut controller = AdaptiveQualityController::new();
        let summary = run_simulation(
            &script(&[(25.0, 100), (400.0, 1), (25.0, 100)]),
            &mut controller,
            true,
            Instant::now(),
        );
        assert!(summary.changes.is_empty());
        assert_eq!(summary.final_tier, QualityTier::Medium);
    }

    #[test]
    fn disabled_auto_adjust_holds_tier() {
        let mut controller = AdaptiveQualityController::new();
        let summary = run_simulation(
            &script(&[(50.0, 200)]),
            &mut controller,
            false,
            Instant::now(),
        );
        assert!(summary.changes.is_empty());
        assert_eq!(summary.final_tier, QualityTier::Medium);
        assert!(summary.pool.pooled <= summary.pool.max_size);
    }

    #[test]
    fn unrepresentable_frame_time_stops_the_run() {
        let mut controller = AdaptiveQualityController::new();
        let summary = run_simulation(
            &script(&[(16.0, 10), (1e30, 1), (16.0, 10)]),
            &mut controller,
            true,
            Instant::now(),
        );
        assert_eq!(summary.frames, 10);
        assert!((summary.simulated_ms - 160.0).abs() < 1e-3);
    }

    #[test]
    fn forced_tier_shares_the_virtual_clock() {
        let mut controller = AdaptiveQualityController::new();
        let start = Instant::now();
        QualityPreference::new(QualityTier::Low, true).apply_at(&mut controller, start);

        // 100 fps: the first step up waits for the cooldown from `start`.
        let summary = run_simulation(&script(&[(10.0, 400)]), &mut controller, true, start);
        assert_eq!(summary.changes.len(), 1);
        assert_eq!(summary.changes[0].tier, QualityTier::Medium);
        assert!(summary.changes[0].frame >= 300);
    }
}
