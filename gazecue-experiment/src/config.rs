use crate::error::ConfigError;
use crate::trial::SchedulerTimings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Upper bound for any configured duration.
pub const MAX_DURATION_MS: u64 = 10 * 60 * 1000;

/// Experiment parameters. Missing keys in a config file fall back to
/// [`ExperimentConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub inter_trial_interval_ms: u64,
    pub stimulus_onset_asyncs_ms: Vec<u64>,
    pub max_response_ms: u64,
    /// Blank screen before the first trial's baseline.
    pub first_trial_delay_ms: u64,
    pub minimum_rest_ms: u64,
    pub random_order: bool,
    pub species_counterbalancing: bool,
    /// Humans first when true, dogs first when false.
    pub counterbalancing_ascending: bool,
    pub trial_debugging: bool,
    /// Fixed shuffle seed; `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            inter_trial_interval_ms: 670,
            stimulus_onset_asyncs_ms: vec![100, 300, 700],
            max_response_ms: 2000,
            first_trial_delay_ms: 1000,
            minimum_rest_ms: 3000,
            random_order: true,
            species_counterbalancing: false,
            counterbalancing_ascending: true,
            trial_debugging: false,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded experiment config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stimulus_onset_asyncs_ms.is_empty() {
            return Err(ConfigError::EmptyOnsetAsyncs);
        }
        let mut seen = HashSet::new();
        for soa in &self.stimulus_onset_asyncs_ms {
            if !seen.insert(*soa) {
                return Err(ConfigError::DuplicateOnsetAsync(*soa));
            }
        }
        if self.max_response_ms == 0 {
            return Err(ConfigError::ZeroResponseWindow);
        }
        let durations = [
            ("inter_trial_interval_ms", self.inter_trial_interval_ms),
            ("max_response_ms", self.max_response_ms),
            ("first_trial_delay_ms", self.first_trial_delay_ms),
            ("minimum_rest_ms", self.minimum_rest_ms),
        ]
        .into_iter()
        .chain(
            self.stimulus_onset_asyncs_ms
                .iter()
                .map(|soa| ("stimulus_onset_asyncs_ms", *soa)),
        );
        for (field, ms) in durations {
            if ms > MAX_DURATION_MS {
                return Err(ConfigError::DurationTooLong { field, ms });
            }
        }
        Ok(())
    }

    pub fn timings(&self) -> SchedulerTimings {
        SchedulerTimings {
            inter_trial_interval_ms: self.inter_trial_interval_ms,
            max_response_ms: self.max_response_ms,
            minimum_rest_ms: self.minimum_rest_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        ExperimentConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_and_duplicate_onsets() {
        let mut config = ExperimentConfig {
            stimulus_onset_asyncs_ms: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyOnsetAsyncs)));

        config.stimulus_onset_asyncs_ms = vec![100, 300, 100];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateOnsetAsync(100))
        ));
    }

    #[test]
    fn rejects_zero_response_window() {
        let config = ExperimentConfig {
            max_response_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroResponseWindow)));
    }

    #[test]
    fn rejects_durations_past_the_limit() {
        let config = ExperimentConfig {
            max_response_ms: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DurationTooLong {
                field: "max_response_ms",
                ..
            })
        ));

        let config = ExperimentConfig {
            stimulus_onset_asyncs_ms: vec![100, MAX_DURATION_MS + 1],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DurationTooLong {
                field: "stimulus_onset_asyncs_ms",
                ..
            })
        ));

        let config = ExperimentConfig {
            minimum_rest_ms: MAX_DURATION_MS,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "random_order": false, "stimulus_onset_asyncs_ms": [150] }}"#).unwrap();

        let config = ExperimentConfig::from_json_file(file.path()).unwrap();
        assert!(!config.random_order);
        assert_eq!(config.stimulus_onset_asyncs_ms, vec![150]);
        assert_eq!(config.inter_trial_interval_ms, 670);
        assert_eq!(config.max_response_ms, 2000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            ExperimentConfig::from_json_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
