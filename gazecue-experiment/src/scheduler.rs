use crate::trial::{SchedulerTimings, TrialMilestones};
use gazecue_core::{Frame, Key, Response, SchedulerPhase, Trial};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    NotStarted,
    Running,
    Resting,
    Finished,
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    RestEnded,
    Responded {
        trial_index: usize,
        response: Response,
        reaction_time_ms: u64,
        correct: bool,
    },
}

/// Timing state machine that runs one trial at a time.
///
/// All inputs carry a caller-supplied `now_ms` from a monotonic clock. The
/// scheduler never reads a clock itself, and a timeout is only noticed when
/// [`TrialScheduler::tick`] runs, so a key press handled before the tick of
/// the same frame always wins over the timeout.
#[derive(Debug, Clone)]
pub struct TrialScheduler {
    trials: Vec<Trial>,
    timings: SchedulerTimings,
    mode: Mode,
    /// Index of the trial most recently made current; `None` before the first.
    index: Option<usize>,
    milestones: TrialMilestones,
    rest_start_ms: u64,
    rest_taken: bool,
}

impl TrialScheduler {
    pub fn new(trials: Vec<Trial>, timings: SchedulerTimings) -> Self {
        Self {
            trials,
            timings,
            mode: Mode::NotStarted,
            index: None,
            milestones: TrialMilestones::default(),
            rest_start_ms: 0,
            rest_taken: false,
        }
    }

    /// Makes the first trial current with `trial_start_ms` as its baseline.
    /// Nothing is visible before that instant.
    pub fn start(&mut self, trial_start_ms: u64) {
        debug_assert_eq!(self.mode, Mode::NotStarted, "scheduler started twice");
        if self.mode != Mode::NotStarted {
            log::warn!("Ignoring second scheduler start");
            return;
        }
        log::info!(
            "Scheduler starting {} trials, first baseline at {} ms",
            self.trials.len(),
            trial_start_ms
        );
        self.advance_to_next_trial(trial_start_ms);
    }

    /// Index the single rest break falls before, if the session has one.
    pub fn rest_index(&self) -> Option<usize> {
        match self.trials.len() / 2 {
            0 => None,
            half => Some(half),
        }
    }

    /// Moves to the next trial, or into the rest break, or to `Finished`.
    pub fn advance_to_next_trial(&mut self, now_ms: u64) {
        debug_assert_ne!(self.mode, Mode::Finished, "advance past Finished");
        if self.mode == Mode::Finished {
            return;
        }

        let upcoming = self.index.map_or(0, |i| i + 1);
        if !self.rest_taken && self.rest_index() == Some(upcoming) {
            self.mode = Mode::Resting;
            self.rest_start_ms = now_ms;
            self.rest_taken = true;
            log::info!("Rest break before trial {} at {} ms", upcoming + 1, now_ms);
            return;
        }

        self.index = Some(upcoming);
        let Some(trial) = self.trials.get(upcoming) else {
            self.mode = Mode::Finished;
            log::info!("All {} trials finished at {} ms", self.trials.len(), now_ms);
            return;
        };

        self.mode = Mode::Running;
        self.milestones = TrialMilestones::new(now_ms, trial.stimulus_onset_async_ms, &self.timings);
        log::debug!(
            "Trial {}/{} started at {} ms: stimulus {} ms, target {} ms, deadline {} ms",
            upcoming + 1,
            self.trials.len(),
            now_ms,
            self.milestones.stimulus_onset,
            self.milestones.target_onset,
            self.milestones.deadline
        );
    }

    /// Concludes the current trial on timeout, then reports what is visible.
    ///
    /// Repeated calls with the same `now_ms` return the same frame.
    pub fn tick(&mut self, now_ms: u64) -> Frame {
        if self.mode == Mode::Running && now_ms >= self.milestones.deadline {
            if let Some(i) = self.index {
                self.trials[i].record(Response::None, self.timings.max_response_ms);
                log::info!("Trial {} timed out at {} ms", i + 1, now_ms);
            }
            self.advance_to_next_trial(now_ms);
        }
        self.frame_at(now_ms)
    }

    /// Visible elements at `now_ms` without concluding anything.
    pub fn frame_at(&self, now_ms: u64) -> Frame {
        match self.mode {
            Mode::NotStarted | Mode::Finished => Frame::blank(),
            Mode::Resting => Frame::rest(),
            Mode::Running => {
                let m = &self.milestones;
                let Some(trial) = self.current_trial() else {
                    return Frame::blank();
                };
                if now_ms < m.start {
                    return Frame::blank();
                }
                Frame {
                    fixation: true,
                    stimulus: (now_ms >= m.stimulus_onset).then_some(trial.stimulus.image),
                    target: (now_ms >= m.target_onset)
                        .then_some((trial.target.image, trial.target.side)),
                    rest_message: false,
                }
            }
        }
    }

    pub fn phase_at(&self, now_ms: u64) -> SchedulerPhase {
        match self.mode {
            Mode::NotStarted => SchedulerPhase::NotStarted,
            Mode::Resting => SchedulerPhase::Resting,
            Mode::Finished => SchedulerPhase::Finished,
            Mode::Running if now_ms < self.milestones.stimulus_onset => {
                SchedulerPhase::WaitingToShowStimulus
            }
            Mode::Running if now_ms < self.milestones.target_onset => {
                SchedulerPhase::WaitingToShowTarget
            }
            Mode::Running => SchedulerPhase::WaitingForResponseOrTimeout,
        }
    }

    /// Single entry point for key-down events.
    pub fn on_key(&mut self, now_ms: u64, key: Key) -> KeyOutcome {
        match self.mode {
            Mode::NotStarted | Mode::Finished => KeyOutcome::Ignored,
            Mode::Resting => {
                if now_ms < self.rest_start_ms.saturating_add(self.timings.minimum_rest_ms) {
                    return KeyOutcome::Ignored;
                }
                log::info!(
                    "Rest ended after {} ms",
                    now_ms - self.rest_start_ms
                );
                self.advance_to_next_trial(now_ms);
                KeyOutcome::RestEnded
            }
            Mode::Running => {
                let Some(response) = Response::from_key(key) else {
                    return KeyOutcome::Ignored;
                };
                if !self.phase_at(now_ms).allows_response() {
                    return KeyOutcome::Ignored;
                }
                let Some(i) = self.index else {
                    return KeyOutcome::Ignored;
                };
                let reaction_time_ms = now_ms - self.milestones.target_onset;
                let trial = &mut self.trials[i];
                if !trial.record(response, reaction_time_ms) {
                    debug_assert!(false, "trial {i} answered twice");
                    return KeyOutcome::Ignored;
                }
                let correct = trial.response_accuracy();
                log::info!(
                    "Trial {} response {:?} after {} ms ({})",
                    i + 1,
                    response,
                    reaction_time_ms,
                    if correct { "correct" } else { "incorrect" }
                );
                self.advance_to_next_trial(now_ms);
                KeyOutcome::Responded {
                    trial_index: i,
                    response,
                    reaction_time_ms,
                    correct,
                }
            }
        }
    }

    /// Ends the run without recording the in-flight trial.
    pub fn abort(&mut self) {
        if self.mode != Mode::Finished {
            log::warn!(
                "Scheduler aborted with {}/{} trials complete",
                self.completed_count(),
                self.trials.len()
            );
            self.mode = Mode::Finished;
        }
    }

    pub fn is_resting(&self) -> bool {
        self.mode == Mode::Resting
    }

    pub fn is_finished(&self) -> bool {
        self.mode == Mode::Finished
    }

    pub fn rest_taken(&self) -> bool {
        self.rest_taken
    }

    /// Index of the current trial while one is running.
    pub fn current_index(&self) -> Option<usize> {
        match self.mode {
            Mode::Running => self.index,
            _ => None,
        }
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        self.current_index().and_then(|i| self.trials.get(i))
    }

    pub fn milestones(&self) -> Option<TrialMilestones> {
        self.current_index().map(|_| self.milestones)
    }

    /// `(1-based current trial, total)` while a trial is running.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.current_index().map(|i| (i + 1, self.trials.len()))
    }

    /// Most recently concluded trial, with its recorded outcome.
    pub fn last_completed(&self) -> Option<&Trial> {
        self.trials.iter().rev().find(|t| t.is_complete())
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn completed_count(&self) -> usize {
        self.trials.iter().filter(|t| t.is_complete()).count()
    }
}
