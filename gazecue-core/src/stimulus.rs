use crate::coded::Coded;
use crate::target::TargetSide;
use serde::{Deserialize, Serialize};

/// Opaque handle into the image store owned by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Human,
    Dog,
}

impl Coded for Species {
    const VARIABLE: &'static str = "StimulusSpecies";
    const LEVELS: &'static [Self] = &[Species::Human, Species::Dog];

    fn code(self) -> u8 {
        match self {
            Species::Human => 1,
            Species::Dog => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Species::Human => "HUMAN",
            Species::Dog => "DOG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GazeDirection {
    Left,
    Right,
}

impl GazeDirection {
    /// True when the gaze points at the side the target appears on.
    pub fn looks_at(self, side: TargetSide) -> bool {
        matches!(
            (self, side),
            (GazeDirection::Left, TargetSide::Left) | (GazeDirection::Right, TargetSide::Right)
        )
    }
}

impl Coded for GazeDirection {
    const VARIABLE: &'static str = "StimulusGazeDirection";
    const LEVELS: &'static [Self] = &[GazeDirection::Left, GazeDirection::Right];

    fn code(self) -> u8 {
        match self {
            GazeDirection::Left => 1,
            GazeDirection::Right => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            GazeDirection::Left => "LEFT_GAZE",
            GazeDirection::Right => "RIGHT_GAZE",
        }
    }
}

/// A gaze-cue image tagged with its experimental factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StimulusAsset {
    pub species: Species,
    pub gaze_direction: GazeDirection,
    pub number: u32,
    pub image: ImageId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaze_matches_same_side_only() {
        assert!(GazeDirection::Left.looks_at(TargetSide::Left));
        assert!(GazeDirection::Right.looks_at(TargetSide::Right));
        assert!(!GazeDirection::Left.looks_at(TargetSide::Right));
        assert!(!GazeDirection::Right.looks_at(TargetSide::Left));
    }

    #[test]
    fn species_codes_are_distinct_and_in_the_legend() {
        let codes: Vec<_> = Species::LEVELS.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![1, 2]);
        assert_eq!(Species::legend(), vec![("HUMAN", 1), ("DOG", 2)]);
    }
}
