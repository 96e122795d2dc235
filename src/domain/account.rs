//! Backend user accounts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::InvalidGenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = InvalidGenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "남자" => Ok(Self::Male),
            "female" | "f" | "여자" => Ok(Self::Female),
            _ => Err(InvalidGenderError {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Age bracket the backend stores instead of an exact age.
///
/// Exchanged as Korean decade labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "10대")]
    Teens,
    #[serde(rename = "20대")]
    Twenties,
    #[serde(rename = "30대")]
    Thirties,
    #[serde(rename = "40대")]
    Forties,
    #[serde(rename = "50대")]
    Fifties,
    #[serde(rename = "60대 이상")]
    SixtiesPlus,
}

impl AgeGroup {
    /// Bracket of an age in years; anything under 20 counts as teens
    pub const fn from_age(age: u32) -> Self {
        match age {
            0..=19 => Self::Teens,
            20..=29 => Self::Twenties,
            30..=39 => Self::Thirties,
            40..=49 => Self::Forties,
            50..=59 => Self::Fifties,
            _ => Self::SixtiesPlus,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Teens => "10대",
            Self::Twenties => "20대",
            Self::Thirties => "30대",
            Self::Forties => "40대",
            Self::Fifties => "50대",
            Self::SixtiesPlus => "60대 이상",
        }
    }
}

/// Registration form sent to `POST /api/user/signup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub gender: Gender,
    pub age_group: AgeGroup,
}

/// The logged-in user as the backend reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    pub email: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "lenient")]
    pub age_group: Option<AgeGroup>,
}

/// Values this client does not know are dropped rather than failing the whole profile
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}
