//! Diary entities as exchanged with the backend

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::date::DiaryDate;
use super::emotion::Emotion;

/// Backend identifier of a diary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiaryId(i64);

impl DiaryId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for DiaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A diary entry owned by the backend, keyed by calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryRecord {
    #[serde(default)]
    pub id: Option<DiaryId>,
    pub date: DiaryDate,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub audio_path: Option<String>,
    #[serde(default, deserialize_with = "lenient_emotion")]
    pub emotion: Option<Emotion>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl DiaryRecord {
    /// Whether the backend holds an audio asset for this entry
    pub fn has_audio(&self) -> bool {
        self.audio_path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Finalized entries carry the generated comment and can no longer be edited
    pub fn is_finalized(&self) -> bool {
        self.comment.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// A calendar day record, carrying the day's emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub date: DiaryDate,
    #[serde(default, deserialize_with = "lenient_emotion")]
    pub emotion: Option<Emotion>,
}

/// Audio bytes attached to a diary submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAttachment {
    file_name: String,
    data: Vec<u8>,
}

impl AudioAttachment {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encode the audio data as base64
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Content sent when saving or finalizing a diary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiarySubmission {
    pub date: DiaryDate,
    pub content: String,
    pub audio: Option<AudioAttachment>,
}

impl DiarySubmission {
    /// Text-only entry
    pub fn text(date: DiaryDate, content: impl Into<String>) -> Self {
        Self {
            date,
            content: content.into(),
            audio: None,
        }
    }

    /// Entry with a voice recording attached
    pub fn voice(date: DiaryDate, content: impl Into<String>, audio: AudioAttachment) -> Self {
        Self {
            date,
            content: content.into(),
            audio: Some(audio),
        }
    }
}

/// Unknown or empty emotion labels from the backend are treated as "no emotion".
fn lenient_emotion<'de, D>(deserializer: D) -> Result<Option<Emotion>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_record() {
        let json = r#"{
            "id": 42,
            "date": "2024-05-17",
            "content": "오늘은 좋은 날",
            "audio_path": "voice_42.wav",
            "emotion": "기쁨",
            "comment": "좋은 하루였네요"
        }"#;

        let record: DiaryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(DiaryId::new(42)));
        assert_eq!(record.date.to_string(), "2024-05-17");
        assert_eq!(record.emotion, Some(Emotion::Joy));
        assert!(record.has_audio());
        assert!(record.is_finalized());
    }

    #[test]
    fn deserialize_draft_with_missing_fields() {
        let json = r#"{"date": "2024-05-17", "content": "draft", "emotion": null}"#;

        let record: DiaryRecord = serde_json::from_str(json).unwrap();
        assert!(record.id.is_none());
        assert!(record.emotion.is_none());
        assert!(!record.has_audio());
        assert!(!record.is_finalized());
    }

    #[test]
    fn unknown_emotion_label_is_ignored() {
        let json = r#"{"date": "2024-05-17", "emotion": "설렘"}"#;
        let day: Day = serde_json::from_str(json).unwrap();
        assert!(day.emotion.is_none());
    }

    #[test]
    fn attachment_encodes_as_base64() {
        let small = AudioAttachment::new("voice_1.wav", vec![1, 2, 3, 4]);
        assert_eq!(small.to_base64(), "AQIDBA==");
        assert_eq!(small.data().len(), 4);
    }

    #[test]
    fn submission_constructors() {
        let date: DiaryDate = "2024-05-17".parse().unwrap();
        let text = DiarySubmission::text(date, "hello");
        assert!(text.audio.is_none());

        let voice = DiarySubmission::voice(date, "", AudioAttachment::new("a.wav", vec![1]));
        assert_eq!(voice.audio.unwrap().file_name(), "a.wav");
    }
}
