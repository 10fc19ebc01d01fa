//! Recall grades offered to the learner after a card is revealed.
//!
//! The classic SM-2 quality scale runs 0-5; only four checkpoints of it are
//! exposed: Again = 1, Hard = 3, Good = 4, Easy = 5.

use crate::error::SchedulerError;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// SM-2 quality score for this grade.
    pub fn quality(self) -> u8 {
        match self {
            Grade::Again => 1,
            Grade::Hard => 3,
            Grade::Good => 4,
            Grade::Easy => 5,
        }
    }

    /// A grade below 3 is a lapse and resets the repetition streak.
    pub fn is_lapse(self) -> bool {
        self.quality() < 3
    }

    pub fn name(self) -> &'static str {
        match self {
            Grade::Again => "Again",
            Grade::Hard => "Hard",
            Grade::Good => "Good",
            Grade::Easy => "Easy",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Grade {
    type Err = SchedulerError;

    /// Accepts grade names in any case, or their numeric quality scores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Grade::ALL
            .into_iter()
            .find(|grade| {
                grade.name().eq_ignore_ascii_case(trimmed) || grade.quality().to_string() == trimmed
            })
            .ok_or_else(|| SchedulerError::InvalidInput(format!("unrecognized grade '{}'", s)))
    }
}

impl TryFrom<&str> for Grade {
    type Error = SchedulerError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<u8> for Grade {
    type Error = SchedulerError;

    fn try_from(quality: u8) -> Result<Self, Self::Error> {
        match quality {
            1 => Ok(Grade::Again),
            3 => Ok(Grade::Hard),
            4 => Ok(Grade::Good),
            5 => Ok(Grade::Easy),
            other => Err(SchedulerError::InvalidInput(format!(
                "quality {} does not correspond to a grade",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_mapping() {
        assert_eq!(Grade::Again.quality(), 1);
        assert_eq!(Grade::Hard.quality(), 3);
        assert_eq!(Grade::Good.quality(), 4);
        assert_eq!(Grade::Easy.quality(), 5);
        assert!(Grade::Again.is_lapse());
        assert!(!Grade::Hard.is_lapse());
    }

    #[test]
    fn test_parse_names_case_insensitive() {
        assert_eq!("again".parse::<Grade>().unwrap(), Grade::Again);
        assert_eq!("HARD".parse::<Grade>().unwrap(), Grade::Hard);
        assert_eq!(" Good ".parse::<Grade>().unwrap(), Grade::Good);
        assert_eq!(Grade::try_from("easy").unwrap(), Grade::Easy);
    }

    #[test]
    fn test_parse_numeric_scores() {
        assert_eq!("4".parse::<Grade>().unwrap(), Grade::Good);
        assert_eq!(Grade::try_from(1u8).unwrap(), Grade::Again);
        for grade in Grade::ALL {
            assert_eq!(grade.quality().to_string().parse::<Grade>().unwrap(), grade);
        }
    }

    #[test]
    fn test_unrecognized_grades_rejected() {
        for bad in ["", "perfect", "0", "2", "6", "-1", "+4", "04", "4.0", "Go od"] {
            let err = bad.parse::<Grade>().unwrap_err();
            assert!(matches!(err, SchedulerError::InvalidInput(_)), "{bad}");
        }
    }
}
