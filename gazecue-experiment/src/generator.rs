use crate::config::ExperimentConfig;
use crate::error::ConfigError;
use gazecue_core::{Coded, StimulusAsset, TargetAsset, Trial};
use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Reverse;

/// Builds the full stimulus × target × onset-asynchrony trial list and orders it.
#[derive(Debug, Clone)]
pub struct TrialGenerator {
    onset_asyncs_ms: Vec<u64>,
    random_order: bool,
    species_counterbalancing: bool,
    counterbalancing_ascending: bool,
}

impl TrialGenerator {
    pub fn new(config: &ExperimentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            onset_asyncs_ms: config.stimulus_onset_asyncs_ms.clone(),
            random_order: config.random_order,
            species_counterbalancing: config.species_counterbalancing,
            counterbalancing_ascending: config.counterbalancing_ascending,
        })
    }

    /// Stimulus-major, target next, onset asynchrony innermost; then shuffled
    /// and/or grouped by species as configured.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        stimuli: &[StimulusAsset],
        targets: &[TargetAsset],
        rng: &mut R,
    ) -> Vec<Trial> {
        let mut trials =
            Vec::with_capacity(stimuli.len() * targets.len() * self.onset_asyncs_ms.len());
        for stimulus in stimuli {
            for target in targets {
                for soa in &self.onset_asyncs_ms {
                    trials.push(Trial::new(*stimulus, *target, *soa));
                }
            }
        }

        if self.random_order {
            trials.shuffle(rng);
        }

        // sort_by_key is stable, so the shuffled order survives within each species
        if self.species_counterbalancing {
            if self.counterbalancing_ascending {
                trials.sort_by_key(|t| t.stimulus.species.code());
            } else {
                trials.sort_by_key(|t| Reverse(t.stimulus.species.code()));
            }
        }

        log::info!(
            "Generated {} trials ({} stimuli × {} targets × {} onsets, random={}, counterbalanced={})",
            trials.len(),
            stimuli.len(),
            targets.len(),
            self.onset_asyncs_ms.len(),
            self.random_order,
            self.species_counterbalancing
        );
        trials
    }
}
