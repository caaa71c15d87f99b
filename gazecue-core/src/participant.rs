use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

pub const AGE_RANGE: RangeInclusive<u32> = 18..=120;
pub const GENDER_CODES: RangeInclusive<u8> = 1..=3;
pub const CULTURE_CODES: RangeInclusive<u8> = 1..=9;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParticipantError {
    #[error("participant id must be positive")]
    ZeroId,

    #[error("age {0} outside {min}..={max}", min = AGE_RANGE.start(), max = AGE_RANGE.end())]
    Age(u32),

    #[error("gender code {0} outside {min}..={max}", min = GENDER_CODES.start(), max = GENDER_CODES.end())]
    Gender(u8),

    #[error("culture code {0} outside {min}..={max}", min = CULTURE_CODES.start(), max = CULTURE_CODES.end())]
    Culture(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: u32,
    pub age: u32,
    pub gender: u8,
    pub culture: u8,
}

impl Participant {
    pub fn new(id: u32, age: u32, gender: u8, culture: u8) -> Result<Self, ParticipantError> {
        if id == 0 {
            return Err(ParticipantError::ZeroId);
        }
        if !AGE_RANGE.contains(&age) {
            return Err(ParticipantError::Age(age));
        }
        if !GENDER_CODES.contains(&gender) {
            return Err(ParticipantError::Gender(gender));
        }
        if !CULTURE_CODES.contains(&culture) {
            return Err(ParticipantError::Culture(culture));
        }
        Ok(Self {
            id,
            age,
            gender,
            culture,
        })
    }

    /// Column name / value pairs used to tag every output row.
    pub fn fields(&self) -> [(&'static str, u32); 4] {
        [
            ("participant_id", self.id),
            ("participant_age", self.age),
            ("participant_gender", u32::from(self.gender)),
            ("participant_culture", u32::from(self.culture)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_on_the_boundaries() {
        assert!(Participant::new(1, 18, 1, 1).is_ok());
        assert!(Participant::new(999_999, 120, 3, 9).is_ok());
    }

    #[test]
    fn rejects_each_field_out_of_range() {
        assert_eq!(Participant::new(0, 30, 1, 1), Err(ParticipantError::ZeroId));
        assert_eq!(Participant::new(4, 17, 1, 1), Err(ParticipantError::Age(17)));
        assert_eq!(Participant::new(4, 121, 1, 1), Err(ParticipantError::Age(121)));
        assert_eq!(Participant::new(4, 30, 4, 1), Err(ParticipantError::Gender(4)));
        assert_eq!(Participant::new(4, 30, 0, 1), Err(ParticipantError::Gender(0)));
        assert_eq!(Participant::new(4, 30, 2, 10), Err(ParticipantError::Culture(10)));
    }

    #[test]
    fn error_messages_name_the_range() {
        assert_eq!(ParticipantError::Age(12).to_string(), "age 12 outside 18..=120");
    }
}
