use crate::coded::Coded;
use crate::frame::Key;
use crate::stimulus::StimulusAsset;
use crate::target::{TargetAsset, TargetLetter};
use serde::{Deserialize, Serialize};

/// Key the participant answered with, or `None` on timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Response {
    #[default]
    None,
    Space,
    H,
}

impl Response {
    /// Maps a key press to a response; keys other than space and `h` carry none.
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Space => Some(Response::Space),
            Key::H => Some(Response::H),
            Key::Other => None,
        }
    }

    /// Letter this response reports: space answers L, `h` answers T.
    pub fn implied_letter(self) -> Option<TargetLetter> {
        match self {
            Response::None => None,
            Response::Space => Some(TargetLetter::L),
            Response::H => Some(TargetLetter::T),
        }
    }
}

impl Coded for Response {
    const VARIABLE: &'static str = "Response";
    const LEVELS: &'static [Self] = &[Response::None, Response::Space, Response::H];

    fn code(self) -> u8 {
        match self {
            Response::None => 0,
            Response::Space => 1,
            Response::H => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Response::None => "NONE",
            Response::Space => "SPACE",
            Response::H => "H",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GazeValidity {
    Valid,
    Invalid,
}

impl Coded for GazeValidity {
    const VARIABLE: &'static str = "GazeValidity";
    const LEVELS: &'static [Self] = &[GazeValidity::Valid, GazeValidity::Invalid];

    fn code(self) -> u8 {
        match self {
            GazeValidity::Valid => 1,
            GazeValidity::Invalid => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            GazeValidity::Valid => "VALID",
            GazeValidity::Invalid => "INVALID",
        }
    }
}

/// One (stimulus, target, onset asynchrony) presentation and its outcome.
///
/// The outcome fields are written once, by [`Trial::record`], and are
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub stimulus: StimulusAsset,
    pub target: TargetAsset,
    pub stimulus_onset_async_ms: u64,
    response: Response,
    reaction_time_ms: Option<u64>,
}

impl Trial {
    pub fn new(stimulus: StimulusAsset, target: TargetAsset, stimulus_onset_async_ms: u64) -> Self {
        Self {
            stimulus,
            target,
            stimulus_onset_async_ms,
            response: Response::None,
            reaction_time_ms: None,
        }
    }

    pub fn response(&self) -> Response {
        self.response
    }

    pub fn reaction_time_ms(&self) -> Option<u64> {
        self.reaction_time_ms
    }

    /// A trial is complete once a response or a timeout has been recorded.
    pub fn is_complete(&self) -> bool {
        self.reaction_time_ms.is_some()
    }

    pub fn gaze_validity(&self) -> GazeValidity {
        if self.is_gaze_valid() {
            GazeValidity::Valid
        } else {
            GazeValidity::Invalid
        }
    }

    pub fn is_gaze_valid(&self) -> bool {
        self.stimulus.gaze_direction.looks_at(self.target.side)
    }

    pub fn response_accuracy(&self) -> bool {
        self.response.implied_letter() == Some(self.target.letter)
    }

    /// Stores the outcome. Returns `false` and leaves the trial untouched if
    /// an outcome was already recorded.
    pub fn record(&mut self, response: Response, reaction_time_ms: u64) -> bool {
        if self.is_complete() {
            return false;
        }
        self.response = response;
        self.reaction_time_ms = Some(reaction_time_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::{GazeDirection, ImageId, Species};
    use crate::target::TargetSide;

    fn trial(letter: TargetLetter, side: TargetSide, gaze: GazeDirection) -> Trial {
        Trial::new(
            StimulusAsset {
                species: Species::Human,
                gaze_direction: gaze,
                number: 1,
                image: ImageId(0),
            },
            TargetAsset {
                letter,
                side,
                image: ImageId(1),
            },
            100,
        )
    }

    #[test]
    fn space_answers_l_and_h_answers_t() {
        let mut l = trial(TargetLetter::L, TargetSide::Left, GazeDirection::Left);
        l.record(Response::Space, 300);
        assert!(l.response_accuracy());

        let mut l = trial(TargetLetter::L, TargetSide::Left, GazeDirection::Left);
        l.record(Response::H, 300);
        assert!(!l.response_accuracy());

        let mut t = trial(TargetLetter::T, TargetSide::Left, GazeDirection::Left);
        t.record(Response::H, 300);
        assert!(t.response_accuracy());

        let mut t = trial(TargetLetter::T, TargetSide::Left, GazeDirection::Left);
        t.record(Response::Space, 300);
        assert!(!t.response_accuracy());
    }

    #[test]
    fn timeout_is_never_accurate() {
        let mut t = trial(TargetLetter::T, TargetSide::Right, GazeDirection::Left);
        assert!(t.record(Response::None, 2000));
        assert!(!t.response_accuracy());
        assert!(t.is_complete());
    }

    #[test]
    fn outcome_is_written_once() {
        let mut t = trial(TargetLetter::L, TargetSide::Right, GazeDirection::Right);
        assert!(!t.is_complete());
        assert!(t.record(Response::Space, 412));
        assert!(!t.record(Response::H, 10));
        assert_eq!(t.response(), Response::Space);
        assert_eq!(t.reaction_time_ms(), Some(412));
    }

    #[test]
    fn gaze_validity_follows_target_side() {
        let valid = trial(TargetLetter::L, TargetSide::Right, GazeDirection::Right);
        let invalid = trial(TargetLetter::L, TargetSide::Left, GazeDirection::Right);
        assert_eq!(valid.gaze_validity(), GazeValidity::Valid);
        assert_eq!(invalid.gaze_validity(), GazeValidity::Invalid);
    }

    #[test]
    fn only_space_and_h_map_to_responses() {
        assert_eq!(Response::from_key(Key::Space), Some(Response::Space));
        assert_eq!(Response::from_key(Key::H), Some(Response::H));
        assert_eq!(Response::from_key(Key::Other), None);
    }
}
