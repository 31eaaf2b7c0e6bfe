use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lowest and highest mood ratings accepted on a profile or history entry.
pub const MOOD_MIN: u8 = 1;
pub const MOOD_MAX: u8 = 5;

/// A single journal / check-in entry from the client's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub text: String,
    pub mood: u8,
    #[serde(default)]
    pub themes: Vec<String>,
}

/// The subject of a generation request. Supplied by the caller and never
/// mutated by the synthesis pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileContext {
    #[serde(default)]
    pub challenges: Vec<String>,
    pub mood: u8,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub coping_strategies: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub progress_areas: Vec<String>,
}

impl ProfileContext {
    /// Checks the numeric ranges the prompt templates rely on.
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if !(MOOD_MIN..=MOOD_MAX).contains(&self.mood) {
            return Err(format!(
                "mood must be between {MOOD_MIN} and {MOOD_MAX}, got {}",
                self.mood
            ));
        }

        if let Some(entry) = self
            .history
            .iter()
            .find(|e| !(MOOD_MIN..=MOOD_MAX).contains(&e.mood))
        {
            return Err(format!(
                "history entry on {} has mood {} (expected {MOOD_MIN}-{MOOD_MAX})",
                entry.date, entry.mood
            ));
        }

        Ok(())
    }

    /// Plain-language description of the current mood rating.
    pub fn mood_label(&self) -> &'static str {
        mood_label(self.mood)
    }
}

pub fn mood_label(mood: u8) -> &'static str {
    match mood {
        0 | 1 => "very low",
        2 => "low",
        3 => "neutral",
        4 => "good",
        _ => "very good",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_with_missing_lists() {
        let json = serde_json::json!({ "mood": 3 });
        let profile: ProfileContext = serde_json::from_value(json).unwrap();
        assert_eq!(profile.mood, 3);
        assert!(profile.challenges.is_empty());
        assert!(profile.history.is_empty());
    }

    #[test]
    fn test_history_entry_parses_iso_date() {
        let json = serde_json::json!({
            "date": "2024-03-18",
            "text": "Slept badly, anxious before work",
            "mood": 2,
            "themes": ["sleep", "work"]
        });
        let entry: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 3, 18).unwrap());
        assert_eq!(entry.themes, vec!["sleep", "work"]);
    }

    #[test]
    fn test_validate_rejects_out_of_range_mood() {
        let profile = ProfileContext {
            mood: 6,
            ..Default::default()
        };
        assert!(profile.validate().is_err());

        let profile = ProfileContext {
            mood: 0,
            ..Default::default()
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_history_mood() {
        let profile = ProfileContext {
            mood: 3,
            history: vec![HistoryEntry {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                text: "ok".to_string(),
                mood: 9,
                themes: vec![],
            }],
            ..Default::default()
        };
        let err = profile.validate().unwrap_err();
        assert!(err.contains("2024-01-02"));
    }

    #[test]
    fn test_mood_labels() {
        assert_eq!(mood_label(1), "very low");
        assert_eq!(mood_label(3), "neutral");
        assert_eq!(mood_label(5), "very good");
    }
}
