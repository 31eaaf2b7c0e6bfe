//! Field extraction — one declarative rule table per generation kind.
//!
//! Each [`FieldRule`] names the labels a section may appear under and how its
//! block is coerced into a value. Rules are applied independently: a missing or
//! empty section only leaves that one field absent from [`ExtractedFields`].
//! Filling the gaps is the assembler's job.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

use crate::synthesis::kind::{GenerationKind, KindTag};
use crate::synthesis::sections::{normalize, Block, LabelSet, SectionExtractor, Sections};

/// Every field any kind extracts from provider text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Content,
    Description,
    Context,
    Objective,
    Themes,
    TargetChallenges,
    MoodContext,
    PersonalizationNotes,
    AiRole,
    AiPersonality,
    OpeningLine,
    AdaptationRules,
    UserGuidance,
    SuccessMetrics,
    KeyThemes,
    EmotionalPatterns,
    CopingStrategies,
    ProgressIndicators,
    ConcernAreas,
    SuggestedTopics,
    MoodPattern,
    MoodAnalysis,
    MoodRecommendations,
    NextSessionFocus,
    Summary,
    Objectives,
    ProgressTracking,
    Instructions,
    DurationMinutes,
    Materials,
    ReflectionPrompts,
    Category,
    TargetAudience,
    Techniques,
    CallToAction,
    Tags,
}

/// How a section's block becomes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// First non-empty line only; the rest of the block stays unclaimed.
    Line,
    /// Whole block, trimmed.
    Text,
    /// Bullet items.
    List,
    /// Bullet items, or a comma/semicolon separated first line when there are none.
    ListOrInline,
    /// First positive integer in the block.
    Number,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Number(u32),
}

impl Coercion {
    /// Returns `None` when the block holds nothing usable for this coercion.
    pub fn apply(self, block: Block<'_>) -> Option<FieldValue> {
        match self {
            Coercion::Line => non_empty_text(clean(block.first_line())),
            Coercion::Text => non_empty_text(clean(block.as_scalar())),
            Coercion::List => non_empty_list(block.as_list()),
            Coercion::ListOrInline => {
                let bullets = block.as_list();
                if !bullets.is_empty() {
                    return Some(FieldValue::List(bullets));
                }
                let inline = block
                    .first_line()
                    .split([',', ';'])
                    .map(|item| clean(item).to_string())
                    .filter(|item| !item.is_empty())
                    .collect();
                non_empty_list(inline)
            }
            Coercion::Number => first_integer(block.as_scalar())
                .filter(|&n| n > 0)
                .map(FieldValue::Number),
        }
    }
}

fn non_empty_text(value: &str) -> Option<FieldValue> {
    (!value.is_empty()).then(|| FieldValue::Text(value.to_string()))
}

fn non_empty_list(items: Vec<String>) -> Option<FieldValue> {
    (!items.is_empty()).then_some(FieldValue::List(items))
}

/// Strips markdown emphasis and wrapping quotes left around a value.
fn clean(value: &str) -> &str {
    let mut value = value.trim().trim_matches('*').trim();
    for (open, close) in [("\"", "\""), ("“", "”"), ("'", "'")] {
        if let Some(inner) = value
            .strip_prefix(open)
            .and_then(|v| v.strip_suffix(close))
        {
            value = inner.trim();
        }
    }
    value
}

/// First run of ASCII digits in `text`, if it fits a `u32`.
pub fn first_integer(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// One row of a kind's extraction table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub labels: &'static [&'static str],
    pub coercion: Coercion,
}

const fn rule(field: Field, labels: &'static [&'static str], coercion: Coercion) -> FieldRule {
    FieldRule {
        field,
        labels,
        coercion,
    }
}

pub const NARRATIVE_RULES: &[FieldRule] = &[
    rule(Field::Title, &["Title"], Coercion::Line),
    rule(
        Field::Content,
        &["Content", "Story", "Script", "Narrative"],
        Coercion::Text,
    ),
    rule(Field::Themes, &["Themes", "Key Themes"], Coercion::ListOrInline),
    rule(
        Field::TargetChallenges,
        &["Target Challenges", "Challenges Addressed"],
        Coercion::ListOrInline,
    ),
    rule(Field::MoodContext, &["Mood Context"], Coercion::Text),
    rule(
        Field::PersonalizationNotes,
        &["Personalization Notes", "Personalization"],
        Coercion::List,
    ),
];

pub const ROLE_PLAY_RULES: &[FieldRule] = &[
    rule(Field::Title, &["Title", "Scenario Title"], Coercion::Line),
    rule(
        Field::Description,
        &["Description", "Scenario Description"],
        Coercion::Text,
    ),
    rule(Field::Context, &["Context", "Setting", "Background"], Coercion::Text),
    rule(Field::Objective, &["Objective", "Goal"], Coercion::Text),
    rule(Field::AiRole, &["AI Role", "Persona Role", "Role"], Coercion::Line),
    rule(
        Field::AiPersonality,
        &["AI Personality", "Personality"],
        Coercion::Text,
    ),
    rule(Field::OpeningLine, &["Opening Line", "Opening"], Coercion::Text),
    rule(Field::AdaptationRules, &["Adaptation Rules"], Coercion::List),
    rule(
        Field::UserGuidance,
        &["User Guidance", "Guidance", "Tips"],
        Coercion::List,
    ),
    rule(
        Field::SuccessMetrics,
        &["Success Metrics", "Success Criteria"],
        Coercion::List,
    ),
];

pub const CLINICAL_RULES: &[FieldRule] = &[
    rule(Field::KeyThemes, &["Key Themes"], Coercion::List),
    rule(Field::EmotionalPatterns, &["Emotional Patterns"], Coercion::List),
    rule(Field::CopingStrategies, &["Coping Strategies"], Coercion::List),
    rule(Field::ProgressIndicators, &["Progress Indicators"], Coercion::List),
    rule(
        Field::ConcernAreas,
        &["Concern Areas", "Areas of Concern"],
        Coercion::List,
    ),
    rule(Field::SuggestedTopics, &["Suggested Topics"], Coercion::List),
    rule(Field::MoodPattern, &["Mood Pattern", "Mood Trend"], Coercion::Line),
    rule(Field::MoodAnalysis, &["Mood Analysis"], Coercion::Text),
    rule(
        Field::MoodRecommendations,
        &["Mood Recommendations", "Recommendations"],
        Coercion::List,
    ),
    rule(Field::NextSessionFocus, &["Next Session Focus"], Coercion::List),
    rule(Field::Summary, &["Summary", "Clinical Summary"], Coercion::Text),
];

pub const HOMEWORK_RULES: &[FieldRule] = &[
    rule(Field::Title, &["Title", "Plan Title"], Coercion::Line),
    rule(Field::Description, &["Description", "Overview"], Coercion::Text),
    rule(Field::Objectives, &["Objectives", "Goals"], Coercion::List),
    rule(
        Field::PersonalizationNotes,
        &["Personalization Notes", "Personalization"],
        Coercion::List,
    ),
    rule(
        Field::ProgressTracking,
        &["Progress Tracking", "Tracking"],
        Coercion::List,
    ),
];

/// Rules applied inside a single `Day N:` block.
pub const DAY_RULES: &[FieldRule] = &[
    rule(Field::Title, &["Title", "Task"], Coercion::Line),
    rule(Field::Instructions, &["Instructions", "Steps"], Coercion::Text),
    rule(Field::DurationMinutes, &["Duration", "Time"], Coercion::Number),
    rule(Field::Materials, &["Materials", "Materials Needed"], Coercion::List),
    rule(
        Field::ReflectionPrompts,
        &["Reflection Prompts", "Reflection Questions", "Reflection"],
        Coercion::List,
    ),
];

pub const CONTENT_ASSET_RULES: &[FieldRule] = &[
    rule(Field::Title, &["Title", "Headline"], Coercion::Line),
    rule(Field::Category, &["Category"], Coercion::Line),
    rule(Field::Content, &["Content", "Body", "Article"], Coercion::Text),
    rule(
        Field::TargetAudience,
        &["Target Audience", "Audience"],
        Coercion::ListOrInline,
    ),
    rule(
        Field::Techniques,
        &["Techniques", "Therapeutic Techniques"],
        Coercion::ListOrInline,
    ),
    rule(Field::CallToAction, &["Call to Action", "CTA"], Coercion::Text),
    rule(Field::Tags, &["Tags", "Hashtags", "Keywords"], Coercion::ListOrInline),
];

/// `Day 3`, `day 12` — the header of a homework day block.
const DAY_HEADER: &str = r"day[ \t]*\d+";

/// Values located in one provider response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    values: BTreeMap<Field, FieldValue>,
    days: BTreeMap<u32, ExtractedFields>,
}

impl ExtractedFields {
    pub fn insert(&mut self, field: Field, value: FieldValue) {
        self.values.insert(field, value);
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match self.values.get(&field) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn list(&self, field: Field) -> Option<&[String]> {
        match self.values.get(&field) {
            Some(FieldValue::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn number(&self, field: Field) -> Option<u32> {
        match self.values.get(&field) {
            Some(FieldValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn day(&self, day: u32) -> Option<&ExtractedFields> {
        self.days.get(&day)
    }

    /// Number of top-level fields that were located.
    pub fn located(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.days.is_empty()
    }
}

/// A kind's rule table plus its compiled section labels.
#[derive(Debug)]
pub struct FieldExtractorSet {
    rules: &'static [FieldRule],
    extractor: SectionExtractor,
}

impl FieldExtractorSet {
    fn new(rules: &'static [FieldRule]) -> Self {
        let extractor = rules
            .iter()
            .fold(LabelSet::new(), |set, r| set.label(r.labels))
            .compile();
        Self { rules, extractor }
    }

    pub fn for_kind(kind: KindTag) -> &'static FieldExtractorSet {
        static NARRATIVE: LazyLock<FieldExtractorSet> =
            LazyLock::new(|| FieldExtractorSet::new(NARRATIVE_RULES));
        static ROLE_PLAY: LazyLock<FieldExtractorSet> =
            LazyLock::new(|| FieldExtractorSet::new(ROLE_PLAY_RULES));
        static CLINICAL: LazyLock<FieldExtractorSet> = LazyLock::new(|| {
            FieldExtractorSet::new(CLINICAL_RULES)
        });
        static HOMEWORK: LazyLock<FieldExtractorSet> =
            LazyLock::new(|| FieldExtractorSet::new(HOMEWORK_RULES));
        static CONTENT_ASSET: LazyLock<FieldExtractorSet> = LazyLock::new(|| {
            FieldExtractorSet::new(CONTENT_ASSET_RULES)
        });

        match kind {
            KindTag::Narrative => &NARRATIVE,
            KindTag::RolePlay => &ROLE_PLAY,
            KindTag::ClinicalSynthesis => &CLINICAL,
            KindTag::Homework => &HOMEWORK,
            KindTag::ContentAsset => &CONTENT_ASSET,
        }
    }

    pub fn rules(&self) -> &'static [FieldRule] {
        self.rules
    }

    /// Applies every rule to already-normalised text.
    fn extract_normalized(&self, text: &str) -> ExtractedFields {
        let sections = self.extractor.scan(text);
        let mut fields = ExtractedFields::default();
        for (group, rule) in self.rules.iter().enumerate() {
            if let Some(value) = sections
                .first(group)
                .and_then(|section| rule.coercion.apply(section.block))
            {
                fields.insert(rule.field, value);
            }
        }
        fields
    }

    /// Raw text minus every located section. `Line` fields only claim their first
    /// line, so prose following e.g. a title stays unclaimed.
    pub fn unclaimed(&self, raw: &str) -> String {
        let text = normalize(raw);
        let sections = self.extractor.scan(&text);

        let mut claimed: Vec<Range<usize>> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(group, rule)| {
                let section = sections.first(group)?;
                Some(match rule.coercion {
                    Coercion::Line => section.line_span(),
                    _ => section.span.clone(),
                })
            })
            .collect();
        claimed.sort_by_key(|r| r.start);

        let mut remainder = String::with_capacity(text.len());
        let mut cursor = 0;
        for range in claimed {
            if range.start > cursor {
                remainder.push_str(&text[cursor..range.start]);
            }
            cursor = cursor.max(range.end);
        }
        remainder.push_str(&text[cursor.min(text.len())..]);
        remainder.trim().to_string()
    }
}

static DAY_FIELDS: LazyLock<FieldExtractorSet> =
    LazyLock::new(|| FieldExtractorSet::new(DAY_RULES));

/// Finds `Day N` blocks. Every plan-level label also ends a day block, so a
/// trailing `Description:` or `Objectives:` is not swallowed by the last day.
/// Labels a day block uses itself (`Title`) stay day-scoped.
static DAY_BLOCKS: LazyLock<SectionExtractor> = LazyLock::new(|| {
    HOMEWORK_RULES
        .iter()
        .map(|r| {
            r.labels
                .iter()
                .copied()
                .filter(|label| !is_day_label(label))
                .collect::<Vec<_>>()
        })
        .filter(|labels| !labels.is_empty())
        .fold(LabelSet::new().pattern(DAY_HEADER), |set, labels| {
            set.label(&labels)
        })
        .compile()
});

fn is_day_label(label: &str) -> bool {
    DAY_RULES
        .iter()
        .flat_map(|r| r.labels)
        .any(|day_label| day_label.eq_ignore_ascii_case(label))
}

/// Extracts every field the kind defines from raw provider text.
pub fn extract(kind: &GenerationKind, raw: &str) -> ExtractedFields {
    let text = normalize(raw);
    match kind {
        GenerationKind::Homework { .. } => extract_homework(&text),
        GenerationKind::Narrative { .. }
        | GenerationKind::RolePlay { .. }
        | GenerationKind::ClinicalSynthesis { .. }
        | GenerationKind::ContentAsset { .. } => {
            FieldExtractorSet::for_kind(kind.tag()).extract_normalized(&text)
        }
    }
}

fn extract_homework(text: &str) -> ExtractedFields {
    let day_sections = DAY_BLOCKS.scan(text);
    let (days, day_spans) = extract_days(&day_sections);

    // Top-level fields are read with the day blocks cut out, so a missing plan
    // title never picks up the title of Day 1.
    let mut top_text = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in &day_spans {
        top_text.push_str(&text[cursor..span.start]);
        cursor = span.end;
    }
    top_text.push_str(&text[cursor..]);

    let mut fields = FieldExtractorSet::for_kind(KindTag::Homework).extract_normalized(&top_text);
    fields.days = days;
    fields
}

fn extract_days(sections: &Sections<'_>) -> (BTreeMap<u32, ExtractedFields>, Vec<Range<usize>>) {
    let mut days = BTreeMap::new();
    let mut spans = Vec::new();

    for section in sections.iter().filter(|s| s.group == 0) {
        spans.push(section.span.clone());
        let Some(day) = first_integer(section.header) else {
            continue;
        };
        if days.contains_key(&day) {
            continue;
        }
        days.insert(day, extract_day(section.block));
    }

    (days, spans)
}

fn extract_day(block: Block<'_>) -> ExtractedFields {
    let mut fields = DAY_FIELDS.extract_normalized(block.raw());

    // `Day 2: Evening walk` — text after the header doubles as the task title.
    if fields.text(Field::Title).is_none() {
        let inline = DAY_FIELDS.extractor.scan(block.raw()).preamble();
        if let Some(FieldValue::Text(title)) = Coercion::Line.apply(Block::new(inline)) {
            fields.insert(Field::Title, FieldValue::Text(title));
        }
    }

    fields
}

/// Located vs expected field counts for one response; logged to calibrate how
/// often the provider follows the requested format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub located: usize,
    pub expected: usize,
}

impl Coverage {
    pub fn ratio(&self) -> f32 {
        if self.expected == 0 {
            return 1.0;
        }
        self.located as f32 / self.expected as f32
    }
}

pub fn coverage(kind: &GenerationKind, fields: &ExtractedFields) -> Coverage {
    let set = FieldExtractorSet::for_kind(kind.tag());
    let mut located = fields.located();
    let mut expected = set.rules().len();

    if let GenerationKind::Homework { duration_days, .. } = kind {
        expected += DAY_RULES.len() * *duration_days as usize;
        located += (1..=*duration_days)
            .filter_map(|day| fields.day(day))
            .map(ExtractedFields::located)
            .sum::<usize>();
    }

    Coverage { located, expected }
}
