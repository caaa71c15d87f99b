use crate::config::ExperimentConfig;
use crate::error::ExportError;
use crate::export::{ResultSink, ResultsFile, SessionSummary};
use crate::scheduler::{KeyOutcome, TrialScheduler};
use gazecue_core::{Frame, Key, Participant, Trial};
use std::path::PathBuf;

/// Pointer and keyboard capture owned by the display layer.
pub trait InputMode {
    /// Hides the cursor and routes input to the experiment window.
    fn capture(&mut self);
    fn release(&mut self);
}

/// Does nothing; for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInputMode;

impl InputMode for NoInputMode {
    fn capture(&mut self) {}
    fn release(&mut self) {}
}

#[derive(Debug, Clone, Copy)]
struct Flags {
    first_trial_delay_ms: u64,
    random_order: bool,
    species_counterbalancing: bool,
    counterbalancing_ascending: bool,
}

/// Ties a participant, the scheduler and a result sink to one session.
///
/// Session timestamps are written here and nowhere else. Ending is
/// idempotent: the sink sees at most one successful write.
pub struct Session<S: ResultSink> {
    participant: Participant,
    scheduler: TrialScheduler,
    sink: S,
    flags: Flags,
    started_ms: Option<u64>,
    ended_ms: Option<u64>,
    exported: Option<Option<PathBuf>>,
}

impl<S: ResultSink> Session<S> {
    pub fn new(
        participant: Participant,
        trials: Vec<Trial>,
        config: &ExperimentConfig,
        sink: S,
    ) -> Self {
        Self {
            participant,
            scheduler: TrialScheduler::new(trials, config.timings()),
            sink,
            flags: Flags {
                first_trial_delay_ms: config.first_trial_delay_ms,
                random_order: config.random_order,
                species_counterbalancing: config.species_counterbalancing,
                counterbalancing_ascending: config.counterbalancing_ascending,
            },
            started_ms: None,
            ended_ms: None,
            exported: None,
        }
    }

    /// Captures input, stamps the start and schedules the first trial after
    /// the configured delay.
    pub fn start_session(&mut self, now_ms: u64, input: &mut dyn InputMode) {
        if self.started_ms.is_some() {
            log::warn!("Session for participant {} already started", self.participant.id);
            return;
        }
        input.capture();
        self.started_ms = Some(now_ms);
        log::info!(
            "Session started for participant {} at {} ms with {} trials",
            self.participant.id,
            now_ms,
            self.scheduler.trials().len()
        );
        self.scheduler
            .start(now_ms.saturating_add(self.flags.first_trial_delay_ms));
    }

    /// Advances the run. Once the session has ended the trial data is
    /// frozen and nothing is shown.
    pub fn tick(&mut self, now_ms: u64) -> Frame {
        if self.ended_ms.is_some() {
            return Frame::blank();
        }
        self.scheduler.tick(now_ms)
    }

    pub fn on_key(&mut self, now_ms: u64, key: Key) -> KeyOutcome {
        if self.ended_ms.is_some() {
            return KeyOutcome::Ignored;
        }
        self.scheduler.on_key(now_ms, key)
    }

    /// Stamps the end, stops the scheduler, releases input and exports once.
    ///
    /// A second call returns the first export's outcome without writing
    /// again. After a failed export, use [`Session::retry_export`].
    pub fn end_session(
        &mut self,
        now_ms: u64,
        input: &mut dyn InputMode,
    ) -> Result<Option<PathBuf>, ExportError> {
        if self.started_ms.is_none() {
            log::warn!("Ending a session that never started; nothing to export");
            return Ok(None);
        }
        if let Some(done) = &self.exported {
            return Ok(done.clone());
        }
        if self.ended_ms.is_none() {
            self.scheduler.abort();
            self.ended_ms = Some(now_ms);
            input.release();
            log::info!(
                "Session ended at {} ms: {}/{} trials complete",
                now_ms,
                self.scheduler.completed_count(),
                self.scheduler.trials().len()
            );
        }
        self.export()
    }

    /// Quits mid-run. The in-flight trial is dropped; completed trials are
    /// still exported.
    pub fn abort(
        &mut self,
        now_ms: u64,
        input: &mut dyn InputMode,
    ) -> Result<Option<PathBuf>, ExportError> {
        self.scheduler.abort();
        self.end_session(now_ms, input)
    }

    /// Re-attempts a failed export. Results already written are not written again.
    pub fn retry_export(&mut self) -> Result<Option<PathBuf>, ExportError> {
        if let Some(done) = &self.exported {
            return Ok(done.clone());
        }
        if self.ended_ms.is_none() {
            log::warn!("Retrying export before the session ended");
            return Ok(None);
        }
        self.export()
    }

    fn export(&mut self) -> Result<Option<PathBuf>, ExportError> {
        let Some(results) = self.results() else {
            return Ok(None);
        };
        match self.sink.write_results(&results) {
            Ok(path) => {
                self.exported = Some(path.clone());
                Ok(path)
            }
            Err(e) => {
                log::error!(
                    "Export for participant {} failed, results kept in memory: {e}",
                    self.participant.id
                );
                Err(e)
            }
        }
    }

    /// Summary of a session that has started and ended.
    pub fn summary(&self) -> Option<SessionSummary> {
        let (started_ms, ended_ms) = (self.started_ms?, self.ended_ms?);
        Some(SessionSummary {
            participant_id: self.participant.id,
            started_ms,
            ended_ms,
            duration_ms: ended_ms.saturating_sub(started_ms),
            completed_trials: self.scheduler.completed_count(),
            total_trials: self.scheduler.trials().len(),
            random_order: self.flags.random_order,
            species_counterbalancing: self.flags.species_counterbalancing,
            counterbalancing_ascending: self.flags.counterbalancing_ascending,
        })
    }

    pub fn results(&self) -> Option<ResultsFile> {
        Some(ResultsFile::build(
            self.summary()?,
            &self.participant,
            self.scheduler.trials(),
        ))
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn scheduler(&self) -> &TrialScheduler {
        &self.scheduler
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_started(&self) -> bool {
        self.started_ms.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.ended_ms.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn is_exported(&self) -> bool {
        self.exported.is_some()
    }
}
