pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod scheduler;
pub mod session;
pub mod trial;

pub use catalog::{AssetKind, Catalog};
pub use config::ExperimentConfig;
pub use error::{CatalogError, ConfigError, ExportError};
pub use export::{
    ResultExporter, ResultSink, ResultsFile, SessionSummary, TrialRow, next_participant_id,
    read_results, variable_levels,
};
pub use generator::TrialGenerator;
pub use scheduler::{KeyOutcome, TrialScheduler};
pub use session::{InputMode, NoInputMode, Session};
pub use trial::{SchedulerTimings, TrialMilestones};
