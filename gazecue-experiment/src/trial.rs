/// Fixed durations that shape every trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTimings {
    pub inter_trial_interval_ms: u64,
    pub max_response_ms: u64,
    pub minimum_rest_ms: u64,
}

/// Absolute onset times of the current trial, in milliseconds on the
/// caller's monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrialMilestones {
    pub start: u64,
    pub stimulus_onset: u64,
    pub target_onset: u64,
    pub deadline: u64,
}

impl TrialMilestones {
    pub fn new(start: u64, stimulus_onset_async_ms: u64, timings: &SchedulerTimings) -> Self {
        let stimulus_onset = start.saturating_add(timings.inter_trial_interval_ms);
        let target_onset = stimulus_onset.saturating_add(stimulus_onset_async_ms);
        Self {
            start,
            stimulus_onset,
            target_onset,
            deadline: target_onset.saturating_add(timings.max_response_ms),
        }
    }
}
