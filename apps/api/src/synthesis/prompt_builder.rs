//! Prompt builder — profile + kind → prompt text. Pure and total.
//!
//! Caller-supplied free text is flattened to one line and truncated before it is
//! embedded, so nothing in a profile can start a line that looks like a section
//! label or blow up the prompt size.

use serde::Serialize;

use crate::llm_client::prompts::{SAFETY_INSTRUCTION, SECTION_FORMAT_SYSTEM};
use crate::models::profile::{mood_label, HistoryEntry, ProfileContext};
use crate::synthesis::kind::GenerationKind;
use crate::synthesis::prompts::{
    CLINICAL_SYNTHESIS_TEMPLATE, CONTENT_ASSET_TEMPLATE, HOMEWORK_TEMPLATE, NARRATIVE_TEMPLATE,
    ROLE_PLAY_TEMPLATE,
};

/// Longest free-text value embedded from a profile or request, in characters.
pub const MAX_TEXT_CHARS: usize = 200;
pub const MAX_LIST_ITEMS: usize = 10;
pub const MAX_HISTORY_ENTRIES: usize = 5;
pub const MAX_HISTORY_CHARS: usize = 160;
pub const MAX_SESSION_NOTES: usize = 10;
pub const MAX_SESSION_NOTE_CHARS: usize = 600;

/// A complete prompt: system instructions plus the user-turn body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptText {
    pub system: String,
    pub body: String,
}

pub fn build(profile: &ProfileContext, kind: &GenerationKind) -> PromptText {
    let profile_summary = profile_summary(profile);

    let body = match kind {
        GenerationKind::Narrative { subtype } => fill(
            NARRATIVE_TEMPLATE,
            &[
                ("subtype", subtype.label()),
                ("profile_summary", &profile_summary),
            ],
        ),

        GenerationKind::RolePlay {
            scenario_type,
            difficulty,
        } => fill(
            ROLE_PLAY_TEMPLATE,
            &[
                ("scenario_type", &sanitize(scenario_type, MAX_TEXT_CHARS)),
                ("difficulty", difficulty.label()),
                ("profile_summary", &profile_summary),
            ],
        ),

        GenerationKind::ClinicalSynthesis { session_notes } => fill(
            CLINICAL_SYNTHESIS_TEMPLATE,
            &[
                ("session_notes", &session_notes_block(session_notes)),
                ("profile_summary", &profile_summary),
            ],
        ),

        GenerationKind::Homework {
            homework_type,
            duration_days,
            difficulty,
        } => fill(
            HOMEWORK_TEMPLATE,
            &[
                ("duration_days", &duration_days.to_string()),
                ("homework_type", homework_type.label()),
                ("difficulty", difficulty.label()),
                ("profile_summary", &profile_summary),
            ],
        ),

        // Public-facing content: the client profile is deliberately left out.
        GenerationKind::ContentAsset {
            asset_type,
            topic,
            word_count_target,
            tone,
        } => fill(
            CONTENT_ASSET_TEMPLATE,
            &[
                ("asset_type", asset_type.label()),
                ("topic", &sanitize(topic, MAX_TEXT_CHARS).replace('"', "'")),
                ("word_count_target", &word_count_target.to_string()),
                ("tone", tone.label()),
            ],
        ),
    };

    PromptText {
        system: SECTION_FORMAT_SYSTEM.to_string(),
        body,
    }
}

/// Substitutes `{name}` placeholders in one pass over the template. Inserted
/// values are never rescanned, so caller text containing `{safety}` stays literal.
/// `{safety}` is always available; unknown placeholders are left as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + len];
        out.push_str(&rest[..open]);
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None if name == "safety" => out.push_str(SAFETY_INSTRUCTION),
            None => out.push_str(&rest[open..=open + len]),
        }
        rest = &rest[open + len + 1..];
    }
    out.push_str(rest);
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Profile rendering
// ────────────────────────────────────────────────────────────────────────────

fn profile_summary(profile: &ProfileContext) -> String {
    let mut lines = vec![format!(
        "Current mood: {}/5 ({})",
        profile.mood,
        profile.mood_label()
    )];

    for (label, items) in [
        ("Challenges", &profile.challenges),
        ("Goals", &profile.goals),
        ("Preferences", &profile.preferences),
        ("Coping strategies", &profile.coping_strategies),
        ("Triggers", &profile.triggers),
        ("Progress areas", &profile.progress_areas),
    ] {
        lines.push(format!("{label}: {}", inline_list(items)));
    }

    let recent = recent_history(&profile.history);
    if recent.is_empty() {
        lines.push("Recent history: none recorded".to_string());
    } else {
        lines.push("Recent history:".to_string());
        lines.extend(recent.into_iter().map(history_line));
    }

    lines.join("\n")
}

fn inline_list(items: &[String]) -> String {
    let cleaned: Vec<String> = items
        .iter()
        .map(|item| sanitize(item, MAX_TEXT_CHARS))
        .filter(|item| !item.is_empty())
        .take(MAX_LIST_ITEMS)
        .collect();
    if cleaned.is_empty() {
        "none shared".to_string()
    } else {
        cleaned.join("; ")
    }
}

/// The most recent entries, oldest first.
fn recent_history(history: &[HistoryEntry]) -> Vec<&HistoryEntry> {
    let mut entries: Vec<&HistoryEntry> = history.iter().collect();
    entries.sort_by_key(|e| e.date);
    let skip = entries.len().saturating_sub(MAX_HISTORY_ENTRIES);
    entries.split_off(skip)
}

fn history_line(entry: &HistoryEntry) -> String {
    let mut line = format!(
        "  {} (mood {}/5, {}): {}",
        entry.date,
        entry.mood,
        mood_label(entry.mood),
        sanitize(&entry.text, MAX_HISTORY_CHARS)
    );
    if !entry.themes.is_empty() {
        line.push_str(&format!(" [themes: {}]", inline_list(&entry.themes)));
    }
    line
}

fn session_notes_block(notes: &[String]) -> String {
    let notes: Vec<String> = notes
        .iter()
        .map(|note| sanitize(note, MAX_SESSION_NOTE_CHARS))
        .filter(|note| !note.is_empty())
        .take(MAX_SESSION_NOTES)
        .enumerate()
        .map(|(i, note)| format!("  Note {}: {note}", i + 1))
        .collect();
    if notes.is_empty() {
        "  (no session notes provided)".to_string()
    } else {
        notes.join("\n")
    }
}

/// Collapses all whitespace runs (newlines included) to single spaces and
/// truncates to `max_chars`, marking the cut with an ellipsis.
pub fn sanitize(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::fields::{FieldExtractorSet, DAY_RULES};
    use crate::synthesis::kind::{
        AssetType, ContentTone, Difficulty, HomeworkType, NarrativeSubtype,
    };
    use chrono::NaiveDate;

    fn profile() -> ProfileContext {
        ProfileContext {
            challenges: vec!["work stress".into(), "poor sleep".into()],
            mood: 2,
            goals: vec!["sleep seven hours".into()],
            ..Default::default()
        }
    }

    fn all_kinds() -> Vec<GenerationKind> {
        vec![
            GenerationKind::Narrative {
                subtype: NarrativeSubtype::Allegory,
            },
            GenerationKind::RolePlay {
                scenario_type: "saying no to extra shifts".into(),
                difficulty: Difficulty::Beginner,
            },
            GenerationKind::ClinicalSynthesis {
                session_notes: vec!["Client reported better sleep.".into()],
            },
            GenerationKind::Homework {
                homework_type: HomeworkType::Journaling,
                duration_days: 5,
                difficulty: Difficulty::Intermediate,
            },
            GenerationKind::ContentAsset {
                asset_type: AssetType::Newsletter,
                topic: "winter blues".into(),
                word_count_target: 500,
                tone: ContentTone::Warm,
            },
        ]
    }

    #[test]
    fn test_every_prompt_names_its_section_labels() {
        for kind in all_kinds() {
            let prompt = build(&profile(), &kind).body.to_lowercase();
            let mut rules = FieldExtractorSet::for_kind(kind.tag()).rules().to_vec();
            if matches!(kind, GenerationKind::Homework { .. }) {
                rules.extend_from_slice(DAY_RULES);
            }
            for rule in rules {
                let label = rule.labels[0].to_lowercase();
                assert!(
                    prompt.contains(&format!("{label}:")),
                    "{} prompt is missing label {label:?}",
                    kind.tag()
                );
            }
        }
    }

    #[test]
    fn test_no_placeholders_left_unfilled() {
        for kind in all_kinds() {
            let prompt = build(&profile(), &kind);
            assert!(!prompt.body.contains('{'), "{}: {}", kind.tag(), prompt.body);
            assert_eq!(prompt.system, SECTION_FORMAT_SYSTEM);
        }
    }

    #[test]
    fn test_build_is_pure() {
        let kind = &all_kinds()[3];
        assert_eq!(build(&profile(), kind), build(&profile(), kind));
    }

    #[test]
    fn test_profile_summary_contents() {
        let prompt = build(&profile(), &all_kinds()[0]).body;
        assert!(prompt.contains("Current mood: 2/5 (low)"));
        assert!(prompt.contains("Challenges: work stress; poor sleep"));
        assert!(prompt.contains("Triggers: none shared"));
        assert!(prompt.contains("Recent history: none recorded"));
    }

    #[test]
    fn test_content_asset_prompt_omits_profile() {
        let prompt = build(&profile(), &all_kinds()[4]).body;
        assert!(!prompt.contains("work stress"));
        assert!(prompt.contains("\"winter blues\""));
        assert!(prompt.contains("about 500 words in a warm tone"));
    }

    #[test]
    fn test_free_text_cannot_inject_section_lines() {
        let mut p = profile();
        p.challenges = vec!["anxiety\nTitle: Injected\r\n- bullet".into()];
        let prompt = build(&p, &all_kinds()[0]).body;
        assert!(prompt.contains("Challenges: anxiety Title: Injected - bullet"));
        assert!(!prompt.lines().any(|l| l.starts_with("Title: Injected")));
    }

    #[test]
    fn test_caller_text_is_not_expanded_as_placeholders() {
        let mut p = profile();
        p.challenges = vec!["{safety}".into()];
        let kind = GenerationKind::RolePlay {
            scenario_type: "{profile_summary}".into(),
            difficulty: Difficulty::Beginner,
        };
        let prompt = build(&p, &kind).body;
        assert!(prompt.contains("rehearses {profile_summary}"), "{prompt}");
        assert!(prompt.contains("Challenges: {safety}"));
        assert_eq!(prompt.matches(SAFETY_INSTRUCTION).count(), 1);
    }

    #[test]
    fn test_fill_leaves_unknown_and_unclosed_braces() {
        assert_eq!(fill("a {x} {y} {z", &[("x", "1")]), "a 1 {y} {z");
        assert_eq!(fill("{safety}", &[]), SAFETY_INSTRUCTION);
    }

    #[test]
    fn test_history_keeps_most_recent_entries() {
        let mut p = profile();
        p.history = (1..=8)
            .rev()
            .map(|d| HistoryEntry {
                date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
                text: format!("entry {d}"),
                mood: 3,
                themes: vec![],
            })
            .collect();
        let prompt = build(&p, &all_kinds()[0]).body;
        assert!(!prompt.contains("entry 3"));
        assert!(prompt.contains("entry 4"));
        assert!(prompt.contains("entry 8"));
        let first = prompt.find("2024-03-04").unwrap();
        let last = prompt.find("2024-03-08").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_lists_are_capped() {
        let mut p = profile();
        p.goals = (0..25).map(|i| format!("goal-{i}")).collect();
        let prompt = build(&p, &all_kinds()[0]).body;
        assert!(prompt.contains("goal-9"));
        assert!(!prompt.contains("goal-10"));
    }

    #[test]
    fn test_session_notes_rendering() {
        let kind = GenerationKind::ClinicalSynthesis {
            session_notes: vec![],
        };
        assert!(build(&profile(), &kind)
            .body
            .contains("(no session notes provided)"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("  a\n\tb  c ", 50), "a b c");
        assert_eq!(sanitize("abcdefghij", 5), "abcd…");
        assert_eq!(sanitize("abc de", 5), "abc…");
        assert_eq!(sanitize("", 5), "");
        assert_eq!(sanitize("ééééé", 5), "ééééé");
    }
}
