//! Record assembly — merges extracted fields with the fallback policy.
//!
//! This is the single place where gaps are filled. For every field: the
//! extracted value if one was located, else the fallback. Derived fields
//! (narrative duration, content word count) are computed from the final text,
//! then identity and timestamp are stamped. Assembly cannot fail.

use chrono::Utc;
use uuid::Uuid;

use crate::synthesis::fallback;
use crate::synthesis::fields::{ExtractedFields, Field, FieldExtractorSet};
use crate::synthesis::kind::{GenerationKind, MAX_HOMEWORK_DAYS};
use crate::synthesis::records::{
    AiPersona, ClinicalSynthesis, ContentAsset, DailyTask, HomeworkPlan, MoodPattern, MoodTrend,
    RolePlayScenario, SynthesisRecord, TherapeuticNarrative,
};
use crate::synthesis::sections::word_count;

/// Average reading / listening pace used for narrative duration.
pub const WORDS_PER_MINUTE: usize = 200;

fn text_or(fields: &ExtractedFields, field: Field, default: String) -> String {
    fields
        .text(field)
        .map(str::to_string)
        .unwrap_or(default)
}

fn list_or(fields: &ExtractedFields, field: Field, default: Vec<String>) -> Vec<String> {
    fields
        .list(field)
        .filter(|items| !items.is_empty())
        .map(<[String]>::to_vec)
        .unwrap_or(default)
}

/// Free-form content: the `Content` section, else whatever text no section claimed.
fn unclaimed_if_missing(kind: &GenerationKind, fields: &ExtractedFields, raw: &str) -> String {
    if fields.text(Field::Content).is_some() {
        return String::new();
    }
    FieldExtractorSet::for_kind(kind.tag()).unclaimed(raw)
}

/// Builds the final record for `kind` from extracted fields and the raw response.
pub fn assemble(kind: &GenerationKind, fields: &ExtractedFields, raw: &str) -> SynthesisRecord {
    let id = Uuid::new_v4();
    let created_at = Utc::now();

    match kind {
        GenerationKind::Narrative { subtype } => {
            let d = fallback::narrative(*subtype, &unclaimed_if_missing(kind, fields, raw));
            let content = text_or(fields, Field::Content, d.content);
            let duration_minutes = word_count(&content).div_ceil(WORDS_PER_MINUTE) as u32;

            SynthesisRecord::Narrative(TherapeuticNarrative {
                id,
                created_at,
                subtype: *subtype,
                title: text_or(fields, Field::Title, d.title),
                content,
                themes: list_or(fields, Field::Themes, d.themes),
                duration_minutes,
                target_challenges: list_or(fields, Field::TargetChallenges, d.target_challenges),
                mood_context: text_or(fields, Field::MoodContext, d.mood_context),
                personalization_notes: list_or(
                    fields,
                    Field::PersonalizationNotes,
                    d.personalization_notes,
                ),
            })
        }

        GenerationKind::RolePlay {
            scenario_type,
            difficulty,
        } => {
            let d = fallback::role_play(scenario_type, *difficulty);

            SynthesisRecord::RolePlay(RolePlayScenario {
                id,
                created_at,
                scenario_type: scenario_type.trim().to_string(),
                title: text_or(fields, Field::Title, d.title),
                description: text_or(fields, Field::Description, d.description),
                context: text_or(fields, Field::Context, d.context),
                objective: text_or(fields, Field::Objective, d.objective),
                difficulty: *difficulty,
                ai_persona: AiPersona {
                    role: text_or(fields, Field::AiRole, d.ai_persona.role),
                    personality: text_or(fields, Field::AiPersonality, d.ai_persona.personality),
                    opening_line: text_or(fields, Field::OpeningLine, d.ai_persona.opening_line),
                    adaptation_rules: list_or(
                        fields,
                        Field::AdaptationRules,
                        d.ai_persona.adaptation_rules,
                    ),
                },
                user_guidance: list_or(fields, Field::UserGuidance, d.user_guidance),
                success_metrics: list_or(fields, Field::SuccessMetrics, d.success_metrics),
            })
        }

        GenerationKind::ClinicalSynthesis { .. } => {
            let d = fallback::clinical_synthesis();
            let pattern = fields
                .text(Field::MoodPattern)
                .and_then(MoodPattern::from_text)
                .unwrap_or(d.mood_trend.pattern);

            SynthesisRecord::ClinicalSynthesis(ClinicalSynthesis {
                id,
                created_at,
                key_themes: list_or(fields, Field::KeyThemes, d.key_themes),
                emotional_patterns: list_or(fields, Field::EmotionalPatterns, d.emotional_patterns),
                coping_strategies: list_or(fields, Field::CopingStrategies, d.coping_strategies),
                progress_indicators: list_or(
                    fields,
                    Field::ProgressIndicators,
                    d.progress_indicators,
                ),
                concern_areas: list_or(fields, Field::ConcernAreas, d.concern_areas),
                suggested_topics: list_or(fields, Field::SuggestedTopics, d.suggested_topics),
                mood_trend: MoodTrend {
                    pattern,
                    analysis: text_or(fields, Field::MoodAnalysis, d.mood_trend.analysis),
                    recommendations: list_or(
                        fields,
                        Field::MoodRecommendations,
                        d.mood_trend.recommendations,
                    ),
                },
                next_session_focus: list_or(fields, Field::NextSessionFocus, d.next_session_focus),
                summary: text_or(fields, Field::Summary, d.summary),
            })
        }

        GenerationKind::Homework {
            homework_type,
            duration_days,
            difficulty,
        } => {
            let duration_days = (*duration_days).clamp(1, MAX_HOMEWORK_DAYS);
            let d = fallback::homework(*homework_type, duration_days, *difficulty);

            let daily_tasks = (1..=duration_days)
                .map(|day| {
                    let task = fallback::daily_task(day, *homework_type, *difficulty);
                    match fields.day(day) {
                        Some(found) => merge_day(found, task),
                        None => task,
                    }
                })
                .collect();

            SynthesisRecord::Homework(HomeworkPlan {
                id,
                created_at,
                title: text_or(fields, Field::Title, d.title),
                description: text_or(fields, Field::Description, d.description),
                homework_type: *homework_type,
                difficulty: *difficulty,
                duration_days,
                daily_tasks,
                objectives: list_or(fields, Field::Objectives, d.objectives),
                personalization_notes: list_or(
                    fields,
                    Field::PersonalizationNotes,
                    d.personalization_notes,
                ),
                progress_tracking: list_or(fields, Field::ProgressTracking, d.progress_tracking),
            })
        }

        GenerationKind::ContentAsset {
            asset_type,
            topic,
            tone,
            ..
        } => {
            let d = fallback::content_asset(
                *asset_type,
                topic,
                &unclaimed_if_missing(kind, fields, raw),
            );
            let content = text_or(fields, Field::Content, d.content);
            // Never trust a count the provider states; count what we ship.
            let word_count = word_count(&content) as u32;
            let tags = fields
                .list(Field::Tags)
                .map(normalize_tags)
                .filter(|tags| !tags.is_empty())
                .unwrap_or_else(|| normalize_tags(&d.tags));

            SynthesisRecord::ContentAsset(ContentAsset {
                id,
                created_at,
                title: text_or(fields, Field::Title, d.title),
                asset_type: *asset_type,
                category: text_or(fields, Field::Category, d.category),
                content,
                word_count,
                target_audience: list_or(fields, Field::TargetAudience, d.target_audience),
                techniques: list_or(fields, Field::Techniques, d.techniques),
                call_to_action: text_or(fields, Field::CallToAction, d.call_to_action),
                tags,
                tone: *tone,
            })
        }
    }
}

fn merge_day(found: &ExtractedFields, task: DailyTask) -> DailyTask {
    DailyTask {
        day: task.day,
        title: text_or(found, Field::Title, task.title),
        instructions: text_or(found, Field::Instructions, task.instructions),
        duration_minutes: found
            .number(Field::DurationMinutes)
            .unwrap_or(task.duration_minutes),
        materials: list_or(found, Field::Materials, task.materials),
        reflection_prompts: list_or(found, Field::ReflectionPrompts, task.reflection_prompts),
    }
}

/// Strips hashtag markers and drops case-insensitive duplicates, keeping first spelling.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .map(|t| t.trim().trim_start_matches('#').trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}
