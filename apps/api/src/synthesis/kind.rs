//! Generation kinds — the closed set of request types the pipeline supports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on a homework plan's length. Longer requests are clamped.
pub const MAX_HOMEWORK_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSubtype {
    Story,
    Meditation,
    Visualization,
    Allegory,
}

impl NarrativeSubtype {
    pub fn label(self) -> &'static str {
        match self {
            NarrativeSubtype::Story => "therapeutic story",
            NarrativeSubtype::Meditation => "guided meditation",
            NarrativeSubtype::Visualization => "guided visualization",
            NarrativeSubtype::Allegory => "allegory",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkType {
    Mindfulness,
    Journaling,
    BehavioralActivation,
    Exposure,
    CognitiveRestructuring,
    SkillPractice,
}

impl HomeworkType {
    pub fn label(self) -> &'static str {
        match self {
            HomeworkType::Mindfulness => "mindfulness",
            HomeworkType::Journaling => "journaling",
            HomeworkType::BehavioralActivation => "behavioral activation",
            HomeworkType::Exposure => "gradual exposure",
            HomeworkType::CognitiveRestructuring => "cognitive restructuring",
            HomeworkType::SkillPractice => "skill practice",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    BlogPost,
    SocialPost,
    Newsletter,
    Worksheet,
    Handout,
}

impl AssetType {
    pub fn label(self) -> &'static str {
        match self {
            AssetType::BlogPost => "blog post",
            AssetType::SocialPost => "social media post",
            AssetType::Newsletter => "newsletter",
            AssetType::Worksheet => "worksheet",
            AssetType::Handout => "psychoeducation handout",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentTone {
    #[default]
    Warm,
    Professional,
    Encouraging,
    Educational,
    Conversational,
}

impl ContentTone {
    pub fn label(self) -> &'static str {
        match self {
            ContentTone::Warm => "warm",
            ContentTone::Professional => "professional",
            ContentTone::Encouraging => "encouraging",
            ContentTone::Educational => "educational",
            ContentTone::Conversational => "conversational",
        }
    }
}

/// A generation request: which record to produce, plus its parameters.
///
/// Serialized with an internal `kind` tag, e.g.
/// `{"kind": "homework", "homework_type": "mindfulness", "duration_days": 7, "difficulty": "beginner"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationKind {
    Narrative {
        subtype: NarrativeSubtype,
    },
    RolePlay {
        scenario_type: String,
        #[serde(default)]
        difficulty: Difficulty,
    },
    ClinicalSynthesis {
        #[serde(default)]
        session_notes: Vec<String>,
    },
    Homework {
        homework_type: HomeworkType,
        duration_days: u32,
        #[serde(default)]
        difficulty: Difficulty,
    },
    ContentAsset {
        asset_type: AssetType,
        topic: String,
        word_count_target: u32,
        #[serde(default)]
        tone: ContentTone,
    },
}

impl GenerationKind {
    pub fn tag(&self) -> KindTag {
        match self {
            GenerationKind::Narrative { .. } => KindTag::Narrative,
            GenerationKind::RolePlay { .. } => KindTag::RolePlay,
            GenerationKind::ClinicalSynthesis { .. } => KindTag::ClinicalSynthesis,
            GenerationKind::Homework { .. } => KindTag::Homework,
            GenerationKind::ContentAsset { .. } => KindTag::ContentAsset,
        }
    }

    /// Checks caller-supplied parameters before any provider call is made.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            GenerationKind::RolePlay { scenario_type, .. } if scenario_type.trim().is_empty() => {
                Err("scenario_type cannot be empty".to_string())
            }
            GenerationKind::Homework { duration_days, .. }
                if *duration_days == 0 || *duration_days > MAX_HOMEWORK_DAYS =>
            {
                Err(format!(
                    "duration_days must be between 1 and {MAX_HOMEWORK_DAYS}, got {duration_days}"
                ))
            }
            GenerationKind::ContentAsset { topic, .. } if topic.trim().is_empty() => {
                Err("topic cannot be empty".to_string())
            }
            GenerationKind::ContentAsset {
                word_count_target: 0,
                ..
            } => Err("word_count_target must be greater than zero".to_string()),
            _ => Ok(()),
        }
    }
}

/// Parameter-free discriminant of [`GenerationKind`], used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    Narrative,
    RolePlay,
    ClinicalSynthesis,
    Homework,
    ContentAsset,
}

impl KindTag {
    pub fn as_str(self) -> &'static str {
        match self {
            KindTag::Narrative => "narrative",
            KindTag::RolePlay => "role_play",
            KindTag::ClinicalSynthesis => "clinical_synthesis",
            KindTag::Homework => "homework",
            KindTag::ContentAsset => "content_asset",
        }
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
