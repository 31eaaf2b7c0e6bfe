//! Fallback policy — the default value of every field of every record.
//!
//! Defaults depend only on the request's kind parameters (and, for free-form
//! content, on the unclaimed provider text), so the same request always falls
//! back to the same record content.

use crate::synthesis::kind::{AssetType, Difficulty, HomeworkType, NarrativeSubtype};
use crate::synthesis::records::{AiPersona, DailyTask, MoodPattern, MoodTrend};

pub const DEFAULT_THEMES: &[&str] = &["resilience", "growth", "hope"];

pub const DEFAULT_CALL_TO_ACTION: &str = "If this resonated with you, consider booking a session \
    to explore it further with a therapist who can support your next step.";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Prefers the unclaimed provider text; otherwise the static default.
fn content_or(unclaimed: &str, default: String) -> String {
    let unclaimed = unclaimed.trim();
    if unclaimed.is_empty() {
        default
    } else {
        unclaimed.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Narrative
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeDefaults {
    pub title: String,
    pub content: String,
    pub themes: Vec<String>,
    pub target_challenges: Vec<String>,
    pub mood_context: String,
    pub personalization_notes: Vec<String>,
}

pub fn narrative(subtype: NarrativeSubtype, unclaimed: &str) -> NarrativeDefaults {
    let (title, content) = match subtype {
        NarrativeSubtype::Story => (
            "A Story of Quiet Strength",
            "There was once a traveler who carried a heavy pack up a long hill. \
             Each time the traveler paused to rest, one stone could be set down. \
             By the top, the pack was lighter, and the view was wide enough to hold \
             everything the journey had asked of them.",
        ),
        NarrativeSubtype::Meditation => (
            "A Gentle Grounding Meditation",
            "Find a comfortable position and let your eyes soften. Breathe in slowly \
             through your nose, and let the breath go without effort. Notice the places \
             where your body meets the chair or the floor. With each breath out, allow \
             a little more weight to settle. You are here, and this moment is enough.",
        ),
        NarrativeSubtype::Visualization => (
            "A Safe Place Visualization",
            "Imagine a place where you feel completely at ease. Notice the colors around \
             you, the temperature of the air, and the sounds in the distance. Take a slow \
             breath and let this place become more vivid. Remember that you can return \
             here whenever you need a moment of calm.",
        ),
        NarrativeSubtype::Allegory => (
            "The River and the Stone",
            "A river met a stone in its path. It did not fight the stone, nor did it stop. \
             It found the way around, and over many seasons it shaped the stone into \
             something smooth. Patience, the river learned, is its own kind of strength.",
        ),
    };

    NarrativeDefaults {
        title: title.to_string(),
        content: content_or(unclaimed, content.to_string()),
        themes: strings(DEFAULT_THEMES),
        target_challenges: strings(&["everyday stress"]),
        mood_context: "Written to support a steady, reflective mood.".to_string(),
        personalization_notes: strings(&["Adapted to your stated goals and preferences."]),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Role play
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RolePlayDefaults {
    pub title: String,
    pub description: String,
    pub context: String,
    pub objective: String,
    pub ai_persona: AiPersona,
    pub user_guidance: Vec<String>,
    pub success_metrics: Vec<String>,
}

pub fn role_play(scenario_type: &str, difficulty: Difficulty) -> RolePlayDefaults {
    let scenario = scenario_type.trim();
    let personality = match difficulty {
        Difficulty::Beginner => "Patient, receptive, and quick to acknowledge your point of view",
        Difficulty::Intermediate => "Realistic, occasionally distracted, and needs some convincing",
        Difficulty::Advanced => "Guarded and challenging, pushes back before coming around",
    };

    RolePlayDefaults {
        title: format!("Practice Conversation: {scenario}"),
        description: format!(
            "A guided role-play to rehearse {scenario} in a safe, low-stakes setting."
        ),
        context: "You are starting a conversation you have been putting off. \
                  The other person is available and willing to talk."
            .to_string(),
        objective: "Express your needs clearly and calmly while staying open to the other person."
            .to_string(),
        ai_persona: AiPersona {
            role: "Conversation partner".to_string(),
            personality: personality.to_string(),
            opening_line: "Hi, you wanted to talk? I have a few minutes.".to_string(),
            adaptation_rules: strings(&[
                "Soften your responses if the user shows signs of distress",
                "Acknowledge clear, assertive statements",
                "Ask a clarifying question when the user is vague",
            ]),
        },
        user_guidance: strings(&[
            "Use \"I\" statements to describe how you feel",
            "Pause and breathe before responding",
            "It is fine to restart the conversation at any point",
        ]),
        success_metrics: strings(&[
            "Stated your need in one clear sentence",
            "Stayed calm when the conversation became difficult",
            "Reached a next step or agreement",
        ]),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Clinical synthesis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalDefaults {
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

pub fn clinical_synthesis() -> ClinicalDefaults {
    ClinicalDefaults {
        key_themes: strings(&["emotional regulation", "stress management"]),
        emotional_patterns: strings(&["No distinct emotional pattern identified"]),
        coping_strategies: strings(&["Continue currently effective coping strategies"]),
        progress_indicators: strings(&["Continued engagement in sessions"]),
        concern_areas: strings(&["No specific concerns identified; continue monitoring"]),
        suggested_topics: strings(&[
            "Review of the past week",
            "Coping strategies that helped",
        ]),
        mood_trend: MoodTrend {
            pattern: MoodPattern::Stable,
            analysis: "Mood data did not indicate a clear trend.".to_string(),
            recommendations: strings(&["Continue tracking mood daily"]),
        },
        next_session_focus: strings(&["Check in on current stressors and coping"]),
        summary: "The generated synthesis did not contain a structured summary. \
                  Review the session notes directly before the next session."
            .to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Homework
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HomeworkDefaults {
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub personalization_notes: Vec<String>,
    pub progress_tracking: Vec<String>,
}

pub fn homework(
    homework_type: HomeworkType,
    duration_days: u32,
    difficulty: Difficulty,
) -> HomeworkDefaults {
    let label = homework_type.label();
    HomeworkDefaults {
        title: format!("{duration_days}-Day {} Plan", title_case(label)),
        description: format!(
            "A {duration_days}-day {label} plan with one short practice each day."
        ),
        objectives: strings(&[
            "Build a consistent daily practice",
            "Increase awareness of thoughts, feelings, and behaviors",
            "Develop practical coping skills",
        ]),
        personalization_notes: vec![format!(
            "Tasks are paced for the {} level.",
            difficulty.label()
        )],
        progress_tracking: strings(&[
            "Rate your mood from 1 to 5 before and after each task",
            "Write a one-line note after each day's practice",
        ]),
    }
}

pub fn daily_task(day: u32, homework_type: HomeworkType, difficulty: Difficulty) -> DailyTask {
    let instructions = match homework_type {
        HomeworkType::Mindfulness => {
            "Find a quiet spot and spend a few minutes noticing your breath. \
             When your mind wanders, gently return to the breath."
        }
        HomeworkType::Journaling => {
            "Write freely about what is on your mind today. Note one feeling and what \
             may have triggered it."
        }
        HomeworkType::BehavioralActivation => {
            "Schedule and complete one small activity you used to enjoy or that gives \
             you a sense of accomplishment."
        }
        HomeworkType::Exposure => {
            "Approach one step of your exposure ladder. Stay with the discomfort until \
             it begins to ease, then rate your anxiety."
        }
        HomeworkType::CognitiveRestructuring => {
            "Write down one unhelpful thought, the evidence for and against it, and a \
             more balanced alternative."
        }
        HomeworkType::SkillPractice => {
            "Practice the skill from your last session in one real situation today, \
             then note how it went."
        }
    };

    DailyTask {
        day,
        title: format!("Day {day}: {}", title_case(homework_type.label())),
        instructions: instructions.to_string(),
        duration_minutes: match difficulty {
            Difficulty::Beginner => 10,
            Difficulty::Intermediate => 15,
            Difficulty::Advanced => 20,
        },
        materials: Vec::new(),
        reflection_prompts: strings(&[
            "What did you notice during today's practice?",
            "How did your mood shift afterwards?",
        ]),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Content asset
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ContentAssetDefaults {
    pub title: String,
    pub category: String,
    pub content: String,
    pub target_audience: Vec<String>,
    pub techniques: Vec<String>,
    pub call_to_action: String,
    pub tags: Vec<String>,
}

pub fn content_asset(asset_type: AssetType, topic: &str, unclaimed: &str) -> ContentAssetDefaults {
    let topic = topic.trim();
    let category = match asset_type {
        AssetType::BlogPost | AssetType::Newsletter => "mental health education",
        AssetType::SocialPost => "wellness tips",
        AssetType::Worksheet | AssetType::Handout => "client resources",
    };
    let content = format!(
        "{} is something many people find challenging, and it is okay to need support. \
         Small, consistent steps such as noticing your thoughts, practicing slow breathing, \
         and reaching out to someone you trust can make a real difference over time.",
        capitalize(topic)
    );

    ContentAssetDefaults {
        title: format!("Understanding {}", title_case(topic)),
        category: category.to_string(),
        content: content_or(unclaimed, content),
        target_audience: strings(&["Adults seeking mental health support"]),
        techniques: strings(&["mindfulness", "cognitive reframing"]),
        call_to_action: DEFAULT_CALL_TO_ACTION.to_string(),
        tags: vec![
            topic.to_lowercase(),
            "mental health".to_string(),
            "self-care".to_string(),
        ],
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrative_prefers_unclaimed_text() {
        let d = narrative(NarrativeSubtype::Story, "  The tide came in slowly.  ");
        assert_eq!(d.content, "The tide came in slowly.");
        let d = narrative(NarrativeSubtype::Story, "   ");
        assert!(d.content.starts_with("There was once a traveler"));
        assert_eq!(d.themes, vec!["resilience", "growth", "hope"]);
    }

    #[test]
    fn test_homework_defaults_name_type_and_duration() {
        let d = homework(HomeworkType::BehavioralActivation, 7, Difficulty::Advanced);
        assert_eq!(d.title, "7-Day Behavioral Activation Plan");
        assert_eq!(d.personalization_notes, vec!["Tasks are paced for the advanced level."]);
    }

    #[test]
    fn test_daily_task_duration_scales_with_difficulty() {
        let easy = daily_task(1, HomeworkType::Journaling, Difficulty::Beginner);
        let hard = daily_task(1, HomeworkType::Journaling, Difficulty::Advanced);
        assert!(easy.duration_minutes < hard.duration_minutes);
        assert_eq!(easy.title, "Day 1: Journaling");
        assert!(easy.materials.is_empty());
        assert!(!easy.reflection_prompts.is_empty());
    }

    #[test]
    fn test_content_asset_defaults_use_topic() {
        let d = content_asset(AssetType::BlogPost, "sleep anxiety", "");
        assert_eq!(d.title, "Understanding Sleep Anxiety");
        assert!(d.content.starts_with("Sleep anxiety is"));
        assert_eq!(d.tags[0], "sleep anxiety");
        assert_eq!(d.call_to_action, DEFAULT_CALL_TO_ACTION);
    }

    #[test]
    fn test_role_play_defaults_follow_difficulty() {
        let easy = role_play("asking for a raise", Difficulty::Beginner);
        let hard = role_play("asking for a raise", Difficulty::Advanced);
        assert_eq!(easy.title, "Practice Conversation: asking for a raise");
        assert_ne!(easy.ai_persona.personality, hard.ai_persona.personality);
        assert_eq!(easy.ai_persona.adaptation_rules.len(), 3);
    }

    #[test]
    fn test_every_default_list_is_non_empty() {
        let c = clinical_synthesis();
        for list in [
            &c.key_themes,
            &c.emotional_patterns,
            &c.coping_strategies,
            &c.progress_indicators,
            &c.concern_areas,
            &c.suggested_topics,
            &c.next_session_focus,
            &c.mood_trend.recommendations,
        ] {
            assert!(!list.is_empty());
        }
    }
}
