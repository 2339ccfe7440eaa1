//! Recall score given by the user after seeing the answer.
//! 0 = complete blackout, 5 = perfect response.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_SCORE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidScoreError {
    #[error("score {0} is outside the accepted range 0-5")]
    OutOfRange(i64),
    #[error("score {0:?} is not an integer")]
    NotAnInteger(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub fn new(value: u8) -> Result<Self, InvalidScoreError> {
        if value > MAX_SCORE {
            return Err(InvalidScoreError::OutOfRange(i64::from(value)));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Scores of 3 and above count as a successful recall.
    pub fn is_pass(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<u8> for Score {
    type Error = InvalidScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl TryFrom<i64> for Score {
    type Error = InvalidScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| InvalidScoreError::OutOfRange(value))
            .and_then(Score::new)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl FromStr for Score {
    type Err = InvalidScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| InvalidScoreError::NotAnInteger(s.to_string()))?;
        Score::try_from(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_range() {
        for value in 0..=5u8 {
            assert_eq!(Score::new(value).unwrap().value(), value);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(Score::new(6), Err(InvalidScoreError::OutOfRange(6)));
        assert_eq!(Score::try_from(-1i64), Err(InvalidScoreError::OutOfRange(-1)));
        assert_eq!(
            Score::try_from(300i64),
            Err(InvalidScoreError::OutOfRange(300))
        );
    }

    #[test]
    fn test_parse_from_text() {
        assert_eq!(" 4 ".parse::<Score>().unwrap().value(), 4);
        assert_eq!(
            "3.5".parse::<Score>(),
            Err(InvalidScoreError::NotAnInteger("3.5".to_string()))
        );
        assert_eq!("7".parse::<Score>(), Err(InvalidScoreError::OutOfRange(7)));
    }

    #[test]
    fn test_deserialize_validates() {
        let scores: Vec<Score> = serde_json::from_str("[0, 5, 3]").unwrap();
        assert_eq!(scores.len(), 3);
        assert!(serde_json::from_str::<Vec<Score>>("[1, 9]").is_err());
        assert_eq!(serde_json::to_string(&scores).unwrap(), "[0,5,3]");
    }

    #[test]
    fn test_pass_threshold() {
        assert!(!Score::new(2).unwrap().is_pass());
        assert!(Score::new(3).unwrap().is_pass());
    }
}
