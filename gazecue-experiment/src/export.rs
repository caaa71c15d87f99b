use crate::error::ExportError;
use gazecue_core::{
    Coded, GazeDirection, GazeValidity, Participant, Response, Species, TargetLetter, TargetSide,
    Trial,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Variable name → level label → code.
pub type VariableLevels = BTreeMap<String, BTreeMap<String, u8>>;

/// One completed trial, flattened into coded columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRow {
    pub trial_number: usize,
    pub participant_id: u32,
    pub participant_age: u32,
    pub participant_gender: u8,
    pub participant_culture: u8,
    pub stimulus_species: u8,
    pub stimulus_gaze_direction: u8,
    pub stimulus_number: u32,
    pub target_letter: u8,
    pub target_location: u8,
    pub stimulus_onset_async: u64,
    pub response: u8,
    pub reaction_time: u64,
    pub gaze_validity: u8,
    pub response_accuracy: u8,
    pub counterbalancing: u8,
}

impl TrialRow {
    /// `None` for a trial that never received a response or timeout.
    pub fn new(
        trial_number: usize,
        trial: &Trial,
        participant: &Participant,
        counterbalancing_ascending: bool,
    ) -> Option<Self> {
        let reaction_time = trial.reaction_time_ms()?;
        Some(Self {
            trial_number,
            participant_id: participant.id,
            participant_age: participant.age,
            participant_gender: participant.gender,
            participant_culture: participant.culture,
            stimulus_species: trial.stimulus.species.code(),
            stimulus_gaze_direction: trial.stimulus.gaze_direction.code(),
            stimulus_number: trial.stimulus.number,
            target_letter: trial.target.letter.code(),
            target_location: trial.target.side.code(),
            stimulus_onset_async: trial.stimulus_onset_async_ms,
            response: trial.response().code(),
            reaction_time,
            gaze_validity: trial.gaze_validity().code(),
            response_accuracy: u8::from(trial.response_accuracy()),
            counterbalancing: u8::from(counterbalancing_ascending),
        })
    }
}

/// Session-level facts written alongside the trial table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub participant_id: u32,
    pub started_ms: u64,
    pub ended_ms: u64,
    pub duration_ms: u64,
    pub completed_trials: usize,
    pub total_trials: usize,
    pub random_order: bool,
    pub species_counterbalancing: bool,
    pub counterbalancing_ascending: bool,
}

/// The persisted document: session summary, trial table and legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub session: SessionSummary,
    pub trial_data: Vec<TrialRow>,
    pub variable_levels: VariableLevels,
}

impl ResultsFile {
    /// Rows are numbered from 1 over the completed trials only.
    pub fn build(summary: SessionSummary, participant: &Participant, trials: &[Trial]) -> Self {
        let ascending = summary.counterbalancing_ascending;
        let trial_data = trials
            .iter()
            .filter(|t| t.is_complete())
            .enumerate()
            .filter_map(|(i, t)| TrialRow::new(i + 1, t, participant, ascending))
            .collect();
        Self {
            session: summary,
            trial_data,
            variable_levels: variable_levels(),
        }
    }
}

fn levels_of<C: Coded>() -> (String, BTreeMap<String, u8>) {
    let levels = C::legend()
        .into_iter()
        .map(|(label, code)| (label.to_string(), code))
        .collect();
    (C::VARIABLE.to_string(), levels)
}

/// Legend for every coded column.
pub fn variable_levels() -> VariableLevels {
    [
        levels_of::<Species>(),
        levels_of::<GazeDirection>(),
        levels_of::<TargetLetter>(),
        levels_of::<TargetSide>(),
        levels_of::<Response>(),
        levels_of::<GazeValidity>(),
    ]
    .into_iter()
    .collect()
}

/// Destination for a finished session's results.
pub trait ResultSink {
    /// Persists `results`, returning where they went, or `Ok(None)` when
    /// there was nothing to write.
    fn write_results(&mut self, results: &ResultsFile) -> Result<Option<PathBuf>, ExportError>;
}

/// Writes one pretty-printed JSON document per participant into a data directory.
#[derive(Debug, Clone)]
pub struct ResultExporter {
    data_dir: PathBuf,
}

impl ResultExporter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, participant_id: u32) -> PathBuf {
        self.data_dir.join(format!("{participant_id}.json"))
    }
}

impl ResultSink for ResultExporter {
    fn write_results(&mut self, results: &ResultsFile) -> Result<Option<PathBuf>, ExportError> {
        if results.trial_data.is_empty() {
            log::warn!(
                "No completed trials for participant {}; nothing exported",
                results.session.participant_id
            );
            return Ok(None);
        }

        fs::create_dir_all(&self.data_dir).map_err(|source| ExportError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let path = self.path_for(results.session.participant_id);
        let json = serde_json::to_string_pretty(results)?;
        fs::write(&path, json).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        log::info!(
            "Exported {} trials to {}",
            results.trial_data.len(),
            path.display()
        );
        Ok(Some(path))
    }
}

pub fn read_results(path: &Path) -> Result<ResultsFile, ExportError> {
    let text = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// One past the largest numeric result-file stem in `data_dir`, or 1 when
/// there are none.
pub fn next_participant_id(data_dir: &Path) -> Result<u32, ExportError> {
    let pattern = format!("{}/*.json", glob::Pattern::escape(&data_dir.to_string_lossy()));
    let paths = glob::glob(&pattern).map_err(|e| ExportError::Pattern(e.to_string()))?;

    let highest = paths
        .filter_map(Result::ok)
        .filter_map(|path| path.file_stem()?.to_str()?.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    Ok(highest.saturating_add(1))
}
