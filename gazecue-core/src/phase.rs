/// Where the trial scheduler is at a given instant.
///
/// The three `Waiting*` phases are milestones inside a running trial; they are
/// derived from elapsed time rather than stored.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SchedulerPhase {
    #[default]
    NotStarted,
    WaitingToShowStimulus,
    WaitingToShowTarget,
    WaitingForResponseOrTimeout,
    Resting,
    Finished,
}

impl SchedulerPhase {
    pub fn allows_response(&self) -> bool {
        matches!(self, Self::WaitingForResponseOrTimeout)
    }
}

/// Top level stages of an application run.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Instructions,
    Experiment,
    Finished,
}

impl Stage {
    pub fn next(&self) -> Option<Self> {
        use Stage::*;
        Some(match self {
            Instructions => Experiment,
            Experiment => Finished,
            Finished => return None,
        })
    }

    pub fn is_experiment(&self) -> bool {
        matches!(self, Stage::Experiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_response_window_accepts_answers() {
        assert!(SchedulerPhase::WaitingForResponseOrTimeout.allows_response());
        for phase in [
            SchedulerPhase::NotStarted,
            SchedulerPhase::WaitingToShowStimulus,
            SchedulerPhase::WaitingToShowTarget,
            SchedulerPhase::Resting,
            SchedulerPhase::Finished,
        ] {
            assert!(!phase.allows_response(), "{phase:?}");
        }
    }

    #[test]
    fn stages_run_in_order_and_stop() {
        assert_eq!(Stage::default().next(), Some(Stage::Experiment));
        assert_eq!(Stage::Experiment.next(), Some(Stage::Finished));
        assert_eq!(Stage::Finished.next(), None);
    }
}
