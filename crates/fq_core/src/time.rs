use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Measures wall-clock frame deltas for the host loop.
///
/// The delta returned by `begin_frame` is what the host passes to
/// `AdaptiveQualityController::record_frame_time`. The smoothed values are
/// for overlays and logs only.
pub struct FrameClock {
    /// Deltas above this are logged as hitches. They are still reported as-is.
    pub max_frame_ms: f64,
    pub frame_count: u64,
    pub real_dt_ms: f64,
    last_instant: Instant,

    frame_samples: [f64; FPS_SAMPLE_COUNT],
    frame_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            max_frame_ms: 250.0,
            frame_count: 0,
            real_dt_ms: 0.0,
            last_instant: start,
            frame_samples: [1000.0 / 60.0; FPS_SAMPLE_COUNT],
            frame_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Milliseconds since the previous call (or since construction).
    pub fn begin_frame(&mut self) -> f64 {
        self.begin_frame_at(Instant::now())
    }

    pub fn begin_frame_at(&mut self, now: Instant) -> f64 {
        self.real_dt_ms = now.saturating_duration_since(self.last_instant).as_secs_f64() * 1000.0;
        self.last_instant = now;
        self.frame_count += 1;

        if self.real_dt_ms > self.max_frame_ms {
            log::warn!(
                "Frame {} took {:.1}ms (hitch threshold {}ms)",
                self.frame_count,
                self.real_dt_ms,
                self.max_frame_ms
            );
        }

        self.frame_samples[self.frame_sample_index] = self.real_dt_ms;
        self.frame_sample_index = (self.frame_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_ms: f64 = self.frame_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_ms;
        self.smoothed_fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };

        self.real_dt_ms
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn reports_delta_since_previous_frame() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let dt = clock.begin_frame_at(start + Duration::from_millis(20));
        assert!((dt - 20.0).abs() < 1e-6);
        let dt = clock.begin_frame_at(start + Duration::from_millis(50));
        assert!((dt - 30.0).abs() < 1e-6);
        assert_eq!(clock.frame_count, 2);
    }

    #[test]
    fn smoothing_converges_after_full_window() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        for i in 1..=FPS_SAMPLE_COUNT as u64 {
            clock.begin_frame_at(start + Duration::from_millis(40 * i));
        }
        assert!((clock.smoothed_frame_time_ms - 40.0).abs() < 1e-6);
        assert!((clock.smoothed_fps - 25.0).abs() < 1e-6);
    }

    #[test]
    fn hitches_are_reported_unmodified() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        let dt = clock.begin_frame_at(start + Duration::from_secs(2));
        assert!((dt - 2000.0).abs() < 1e-6);
    }

    #[test]
    fn clock_going_backwards_yields_zero() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start + Duration::from_millis(10));
        assert_eq!(clock.begin_frame_at(start), 0.0);
    }
}
