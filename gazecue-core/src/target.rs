use crate::coded::Coded;
use crate::stimulus::ImageId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetLetter {
    L,
    T,
}

impl Coded for TargetLetter {
    const VARIABLE: &'static str = "TargetLetter";
    const LEVELS: &'static [Self] = &[TargetLetter::L, TargetLetter::T];

    fn code(self) -> u8 {
        match self {
            TargetLetter::L => 1,
            TargetLetter::T => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TargetLetter::L => "L",
            TargetLetter::T => "T",
        }
    }
}

/// Screen side a target is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetSide {
    Left,
    Right,
}

impl TargetSide {
    pub const BOTH: [TargetSide; 2] = [TargetSide::Left, TargetSide::Right];
}

impl Coded for TargetSide {
    const VARIABLE: &'static str = "TargetLocation";
    const LEVELS: &'static [Self] = &[TargetSide::Left, TargetSide::Right];

    fn code(self) -> u8 {
        match self {
            TargetSide::Left => 1,
            TargetSide::Right => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TargetSide::Left => "LEFT_TARGET",
            TargetSide::Right => "RIGHT_TARGET",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetAsset {
    pub letter: TargetLetter,
    pub side: TargetSide,
    pub image: ImageId,
}
