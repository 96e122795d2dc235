//! Emotion tag value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InvalidEmotionError;

/// All emotion tags the backend can assign
pub const ALL_EMOTIONS: &[Emotion] = &[
    Emotion::Joy,
    Emotion::Sadness,
    Emotion::Anger,
    Emotion::Tired,
    Emotion::Neutral,
];

/// Emotion tag attached to a diary entry or day.
///
/// The backend exchanges these as their Korean labels, so that is the
/// serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    #[serde(rename = "기쁨")]
    Joy,
    #[serde(rename = "슬픔")]
    Sadness,
    #[serde(rename = "화남")]
    Anger,
    #[serde(rename = "지침")]
    Tired,
    #[serde(rename = "중립")]
    Neutral,
}

impl Emotion {
    /// Label used on the wire
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Joy => "기쁨",
            Self::Sadness => "슬픔",
            Self::Anger => "화남",
            Self::Tired => "지침",
            Self::Neutral => "중립",
        }
    }

    /// English identifier used on the command line
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Tired => "tired",
            Self::Neutral => "neutral",
        }
    }

    /// Position in [`ALL_EMOTIONS`]
    pub const fn index(&self) -> usize {
        match self {
            Self::Joy => 0,
            Self::Sadness => 1,
            Self::Anger => 2,
            Self::Tired => 3,
            Self::Neutral => 4,
        }
    }
}

impl FromStr for Emotion {
    type Err = InvalidEmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "joy" | "happy" | "기쁨" => Ok(Self::Joy),
            "sadness" | "sad" | "슬픔" => Ok(Self::Sadness),
            "anger" | "angry" | "화남" => Ok(Self::Anger),
            "tired" | "지침" => Ok(Self::Tired),
            "neutral" | "중립" => Ok(Self::Neutral),
            _ => Err(InvalidEmotionError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_english_and_korean() {
        assert_eq!("joy".parse::<Emotion>().unwrap(), Emotion::Joy);
        assert_eq!("기쁨".parse::<Emotion>().unwrap(), Emotion::Joy);
        assert_eq!("Sad".parse::<Emotion>().unwrap(), Emotion::Sadness);
        assert_eq!("화남".parse::<Emotion>().unwrap(), Emotion::Anger);
        assert_eq!(" tired ".parse::<Emotion>().unwrap(), Emotion::Tired);
        assert_eq!("중립".parse::<Emotion>().unwrap(), Emotion::Neutral);
    }

    #[test]
    fn parse_invalid() {
        assert!("excited".parse::<Emotion>().is_err());
        assert!("".parse::<Emotion>().is_err());
    }

    #[test]
    fn serde_uses_korean_labels() {
        assert_eq!(serde_json::to_string(&Emotion::Tired).unwrap(), "\"지침\"");
        let parsed: Emotion = serde_json::from_str("\"슬픔\"").unwrap();
        assert_eq!(parsed, Emotion::Sadness);
    }

    #[test]
    fn indices_match_constant_order() {
        for (i, emotion) in ALL_EMOTIONS.iter().enumerate() {
            assert_eq!(emotion.index(), i);
        }
    }
}
