//! Output records — one fully populated shape per generation kind.
//!
//! Every record is produced once by the assembler and returned by value.
//! List fields are always present (possibly empty), never `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::synthesis::kind::{AssetType, ContentTone, Difficulty, HomeworkType, NarrativeSubtype};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapeuticNarrative {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub subtype: NarrativeSubtype,
    pub title: String,
    pub content: String,
    pub themes: Vec<String>,
    /// Reading time at 200 words per minute, rounded up.
    pub duration_minutes: u32,
    pub target_challenges: Vec<String>,
    pub mood_context: String,
    pub personalization_notes: Vec<String>,
}

/// The counterpart the user rehearses with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPersona {
    pub role: String,
    pub personality: String,
    pub opening_line: String,
    pub adaptation_rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePlayScenario {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub scenario_type: String,
    pub title: String,
    pub description: String,
    pub context: String,
    pub objective: String,
    pub difficulty: Difficulty,
    pub ai_persona: AiPersona,
    pub user_guidance: Vec<String>,
    pub success_metrics: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodPattern {
    Improving,
    #[default]
    Stable,
    Declining,
    Fluctuating,
}

impl MoodPattern {
    /// Reads a pattern from free text such as "Gradually improving since March".
    pub fn from_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        // "not improving" reads as declining more often than not
        if lower.contains("declin") || lower.contains("worse") || lower.contains("not improving") {
            Some(MoodPattern::Declining)
        } else if lower.contains("fluctuat")
            || lower.contains("variable")
            || lower.contains("mixed")
            || lower.contains("up and down")
        {
            Some(MoodPattern::Fluctuating)
        } else if lower.contains("improv") || lower.contains("better") || lower.contains("upward") {
            Some(MoodPattern::Improving)
        } else if lower.contains("stable") || lower.contains("steady") || lower.contains("consistent") {
            Some(MoodPattern::Stable)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodTrend {
    pub pattern: MoodPattern,
    pub analysis: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSynthesis {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub key_themes: Vec<String>,
    pub emotional_patterns: Vec<String>,
    pub coping_strategies: Vec<String>,
    pub progress_indicators: Vec<String>,
    pub concern_areas: Vec<String>,
    pub suggested_topics: Vec<String>,
    pub mood_trend: MoodTrend,
    pub next_session_focus: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTask {
    /// 1-based.
    pub day: u32,
    pub title: String,
    pub instructions: String,
    pub duration_minutes: u32,
    /// Empty when the task needs nothing beyond the client themselves.
    pub materials: Vec<String>,
    pub reflection_prompts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeworkPlan {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub homework_type: HomeworkType,
    pub difficulty: Difficulty,
    pub duration_days: u32,
    /// Exactly `duration_days` entries, ordered by day.
    pub daily_tasks: Vec<DailyTask>,
    pub objectives: Vec<String>,
    pub personalization_notes: Vec<String>,
    pub progress_tracking: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAsset {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub asset_type: AssetType,
    pub category: String,
    pub content: String,
    /// Always recomputed from `content`.
    pub word_count: u32,
    pub target_audience: Vec<String>,
    pub techniques: Vec<String>,
    pub call_to_action: String,
    /// Unique, case-insensitively.
    pub tags: Vec<String>,
    pub tone: ContentTone,
}

/// Any assembled record, tagged with its kind when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthesisRecord {
    Narrative(TherapeuticNarrative),
    RolePlay(RolePlayScenario),
    ClinicalSynthesis(ClinicalSynthesis),
    Homework(HomeworkPlan),
    ContentAsset(ContentAsset),
}

impl SynthesisRecord {
    pub fn id(&self) -> Uuid {
        match self {
            SynthesisRecord::Narrative(r) => r.id,
            SynthesisRecord::RolePlay(r) => r.id,
            SynthesisRecord::ClinicalSynthesis(r) => r.id,
            SynthesisRecord::Homework(r) => r.id,
            SynthesisRecord::ContentAsset(r) => r.id,
        }
    }
}
