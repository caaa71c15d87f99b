use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const MAX_FRAME_SAMPLES: usize = 1000;

/// Monotonic clock that also keeps a window of recent frame durations.
pub trait Timer: Clone + Send + Sync {
    /// Nanoseconds since the timer's origin.
    fn now(&self) -> u64;
    fn record_frame(&mut self, d: Duration);
    fn frame_times(&self) -> &VecDeque<Duration>;

    /// Milliseconds since the timer's origin; the unit the scheduler works in.
    fn now_ms(&self) -> u64 {
        self.now() / 1_000_000
    }

    fn elapsed(&self, since_ns: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(since_ns))
    }

    fn frame_count(&self) -> usize {
        self.frame_times().len()
    }

    fn calibration_stats(&self) -> CalibrationStats {
        CalibrationStats::from_frames(self.frame_times())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl CalibrationStats {
    pub fn from_frames(frames: &VecDeque<Duration>) -> Self {
        if frames.is_empty() {
            return Self::default();
        }
        let times: Vec<f64> = frames.iter().map(|d| d.as_nanos() as f64).collect();
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        CalibrationStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

fn push_frame(frames: &mut VecDeque<Duration>, d: Duration) {
    if frames.len() >= MAX_FRAME_SAMPLES {
        frames.pop_front();
    }
    frames.push_back(d);
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    frame_times: VecDeque<Duration>,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn record_frame(&mut self, d: Duration) {
        push_frame(&mut self.frame_times, d);
    }

    fn frame_times(&self) -> &VecDeque<Duration> {
        &self.frame_times
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: VecDeque::with_capacity(MAX_FRAME_SAMPLES),
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand-driven clock for tests and replays. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
    frame_times: VecDeque<Duration>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ms(&self, ms: u64) {
        self.now_ns.store(ms * 1_000_000, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ns.fetch_add(ms * 1_000_000, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    fn record_frame(&mut self, d: Duration) {
        push_frame(&mut self.frame_times, d);
    }

    fn frame_times(&self) -> &VecDeque<Duration> {
        &self.frame_times
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_timer_clones_share_time() {
        let timer = ManualTimer::new();
        let view = timer.clone();
        timer.set_ms(250);
        timer.advance_ms(20);
        assert_eq!(view.now_ms(), 270);
        assert_eq!(view.elapsed(250 * 1_000_000), Duration::from_millis(20));
    }

    #[test]
    fn stats_of_a_steady_display() {
        let mut timer = ManualTimer::new();
        for _ in 0..10 {
            timer.record_frame(Duration::from_millis(10));
        }
        let stats = timer.calibration_stats();
        assert_eq!(stats.average_frame_time_ns, 10_000_000.0);
        assert_eq!(stats.jitter_ns, 0.0);
        assert!((stats.effective_fps - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stats_track_extremes_and_jitter() {
        let mut timer = ManualTimer::new();
        timer.record_frame(Duration::from_millis(8));
        timer.record_frame(Duration::from_millis(12));
        let stats = timer.calibration_stats();
        assert_eq!(stats.min_frame_time_ns, 8_000_000.0);
        assert_eq!(stats.max_frame_time_ns, 12_000_000.0);
        assert_eq!(stats.jitter_ns, 2_000_000.0);
    }

    #[test]
    fn frame_window_is_bounded() {
        let mut timer = HighPrecisionTimer::new();
        for i in 0..(MAX_FRAME_SAMPLES + 5) {
            timer.record_frame(Duration::from_micros(i as u64));
        }
        assert_eq!(timer.frame_count(), MAX_FRAME_SAMPLES);
        assert_eq!(timer.frame_times()[0], Duration::from_micros(5));
    }

    #[test]
    fn empty_window_reports_zeroes() {
        assert_eq!(
            HighPrecisionTimer::new().calibration_stats(),
            CalibrationStats::default()
        );
    }
}
