pub mod coded;
pub mod frame;
pub mod participant;
pub mod phase;
pub mod stimulus;
pub mod target;
pub mod trial;

pub use coded::Coded;
pub use frame::{Element, Frame, Key};
pub use participant::{Participant, ParticipantError};
pub use phase::{SchedulerPhase, Stage};
pub use stimulus::{GazeDirection, ImageId, Species, StimulusAsset};
pub use target::{TargetAsset, TargetLetter, TargetSide};
pub use trial::{GazeValidity, Response, Trial};
