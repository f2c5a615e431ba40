//! Progress estimation and throttling.
//!
//! The number of entries below the root is unknown until the walk is over,
//! so the percentage is driven by a running estimate of the total. The
//! estimate starts at 1.5x the first processed count and is raised to
//! 1.5x the processed count each time the scan gets within 80% of it. The
//! raw ratio is eased so the bar slows down near the top instead of jumping
//! to 90% and stalling, then clamped to 95% until the scan has finished.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use wheremyspace_core::ScanProgress;

/// Upper bound reported while the scan is still running.
const MAX_RUNNING_PERCENT: f64 = 95.0;

/// Estimate is revised when processed reaches this share of it.
const REVISE_THRESHOLD: f64 = 0.8;

/// Factor applied to the processed count when revising the estimate.
const GROWTH_FACTOR: f64 = 1.5;

/// Easing constant for the saturating transform.
const EASING: f64 = 30.0;

/// Weight of the newest sample in the scan-rate moving average.
const RATE_SMOOTHING: f64 = 0.3;

#[derive(Debug)]
struct EstimatorState {
    processed: u64,
    estimated_total: Option<f64>,
    last_percent: f64,
    last_emit: Instant,
    last_emit_processed: u64,
    rate: f64,
    current_path: PathBuf,
}

/// Turns a stream of processed counts into throttled [`ScanProgress`].
#[derive(Debug)]
pub struct ProgressEstimator {
    interval: Duration,
    every: u64,
    started: Instant,
    state: Mutex<EstimatorState>,
}

impl ProgressEstimator {
    /// Create an estimator that emits at most once per `interval`, or
    /// whenever the processed count crosses a multiple of `every`.
    pub fn new(interval: Duration, every: u64) -> Self {
        let now = Instant::now();
        Self {
            interval,
            every: every.max(1),
            started: now,
            state: Mutex::new(EstimatorState {
                processed: 0,
                estimated_total: None,
                last_percent: 0.0,
                last_emit: now,
                last_emit_processed: 0,
                rate: 0.0,
                current_path: PathBuf::new(),
            }),
        }
    }

    /// Record `count` more processed entries.
    ///
    /// When a progress event is due, `emit` is called with it while the
    /// estimator lock is still held, so concurrent callers deliver their
    /// snapshots in order.
    pub fn on_processed(&self, count: u64, current_path: &Path, emit: impl FnOnce(ScanProgress)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = state.processed;
        state.processed = previous.saturating_add(count);
        state.current_path = current_path.to_path_buf();

        let now = Instant::now();
        let crossed = state.processed / self.every > previous / self.every;
        let since_last = now.duration_since(state.last_emit);
        if !crossed && since_last < self.interval {
            return;
        }

        let percent = self.estimate(&mut state);
        self.update_rate(&mut state, since_last);
        state.last_emit = now;
        state.last_emit_processed = state.processed;

        emit(ScanProgress {
            percent,
            processed_count: state.processed,
            current_path: state.current_path.clone(),
            scan_rate_per_second: state.rate,
        });
    }

    /// Final snapshot, reported once the walk is complete.
    pub fn finish(&self) -> ScanProgress {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.last_percent = 100.0;

        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            state.processed as f64 / elapsed
        } else {
            state.rate
        };

        ScanProgress {
            percent: 100.0,
            processed_count: state.processed,
            current_path: state.current_path.clone(),
            scan_rate_per_second: rate,
        }
    }

    /// Entries processed so far.
    pub fn processed(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .processed
    }

    fn estimate(&self, state: &mut EstimatorState) -> f64 {
        let processed = state.processed as f64;
        let revised = processed * GROWTH_FACTOR;
        let estimate = match state.estimated_total {
            None => revised,
            Some(estimate) if processed >= estimate * REVISE_THRESHOLD => estimate.max(revised),
            Some(estimate) => estimate,
        };
        state.estimated_total = Some(estimate);

        let raw = if estimate > 0.0 {
            processed / estimate * 100.0
        } else {
            0.0
        };
        let eased = raw * (1.0 - (-raw / EASING).exp());

        let percent = eased.min(MAX_RUNNING_PERCENT).max(state.last_percent);
        state.last_percent = percent;
        percent
    }

    fn update_rate(&self, state: &mut EstimatorState, since_last: Duration) {
        let secs = since_last.as_secs_f64();
        if secs <= 0.0 {
            return;
        }
        let sample = (state.processed - state.last_emit_processed) as f64 / secs;
        state.rate = if state.rate == 0.0 {
            sample
        } else {
            RATE_SMOOTHING * sample + (1.0 - RATE_SMOOTHING) * state.rate
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(estimator: &ProgressEstimator, counts: &[u64]) -> Vec<ScanProgress> {
        let mut out = Vec::new();
        for &count in counts {
            estimator.on_processed(count, Path::new("/scan"), |p| out.push(p));
        }
        out
    }

    #[test]
    fn test_first_emission_is_eased() {
        let estimator = ProgressEstimator::new(Duration::ZERO, 100);
        let events = collect(&estimator, &[10]);

        assert_eq!(events.len(), 1);
        // raw = 66.7%, eased = 66.7 * (1 - e^-2.22)
        assert!((events[0].percent - 59.44).abs() < 0.1);
        assert_eq!(events[0].processed_count, 10);
    }

    #[test]
    fn test_percent_is_monotone_and_bounded() {
        let estimator = ProgressEstimator::new(Duration::ZERO, 1);
        let counts: Vec<u64> = (1..500).map(|i| i % 7 + 1).collect();
        let events = collect(&estimator, &counts);

        assert_eq!(events.len(), counts.len());
        for pair in events.windows(2) {
            assert!(pair[1].percent >= pair[0].percent);
            assert!(pair[1].processed_count > pair[0].processed_count);
        }
        assert!(events.iter().all(|p| p.percent <= 95.0));
    }

    #[test]
    fn test_throttled_by_count_modulus() {
        let estimator = ProgressEstimator::new(Duration::from_secs(3600), 100);
        let events = collect(&estimator, &[30, 30, 30, 30, 30, 30, 30]);

        // Crossings at 120 and 210.
        let counts: Vec<_> = events.iter().map(|p| p.processed_count).collect();
        assert_eq!(counts, vec![120, 210]);
    }

    #[test]
    fn test_zero_interval_emits_every_call() {
        let estimator = ProgressEstimator::new(Duration::ZERO, 1_000_000);
        let events = collect(&estimator, &[1, 1, 1, 1]);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_zero_count_does_not_divide_by_zero() {
        let estimator = ProgressEstimator::new(Duration::ZERO, 100);
        let events = collect(&estimator, &[0]);
        assert_eq!(events[0].percent, 0.0);
    }

    #[test]
    fn test_finish_reports_hundred() {
        let estimator = ProgressEstimator::new(Duration::from_secs(3600), 100);
        collect(&estimator, &[5, 5]);

        let last = estimator.finish();
        assert_eq!(last.percent, 100.0);
        assert_eq!(last.processed_count, 10);
        assert_eq!(estimator.processed(), 10);
    }
}
