//! Section extraction — locates labelled blocks inside free-form provider text.
//!
//! A header is a line that starts (after optional markdown `#` / `**`) with a known
//! label followed by a colon, a dash separator, or the end of the line:
//!
//! ```text
//! ## Key Themes
//! **Title:** Calm Harbor
//! Day 3 - Evening check-in
//! ```
//!
//! A section's block runs from the end of its header to the start of the next
//! recognized header (or the end of the text). Matching is case-insensitive and
//! the first occurrence of a label wins. Nothing here fails: a missing label is `None`.

use std::ops::Range;

use regex::Regex;
use tracing::warn;

const HEADER_PREFIX: &str = r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*|__)?[ \t]*";
const HEADER_SUFFIX: &str = r"[ \t]*(?:\*\*|__)?[ \t]*(?::(?:\*\*|__)?|[-–—][ \t]|$)[ \t]*";

/// Boundary used by [`find_section`]: a short heading that ends in a colon and has
/// nothing after it on the line, e.g. `EMOTIONAL PATTERNS:`.
const GENERIC_HEADING: &str = r"[a-z][a-z0-9 '&/()-]{0,48}?(?:\*\*|__)?:(?:\*\*|__)?[ \t]*$";

/// Builder for a [`SectionExtractor`]. Each call to [`LabelSet::label`] or
/// [`LabelSet::pattern`] adds one group; hits report the group index in insertion order.
#[derive(Debug, Default, Clone)]
pub struct LabelSet {
    patterns: Vec<String>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group matched by any of the literal `aliases`. Words may be separated
    /// by spaces, underscores or hyphens in the source text.
    pub fn label(mut self, aliases: &[&str]) -> Self {
        let alternatives = aliases
            .iter()
            .map(|alias| literal_pattern(alias))
            .collect::<Vec<_>>()
            .join("|");
        self.patterns.push(alternatives);
        self
    }

    /// Adds a group matched by a raw regex fragment. The fragment must not contain
    /// capturing groups.
    pub fn pattern(mut self, fragment: &str) -> Self {
        self.patterns.push(fragment.to_string());
        self
    }

    pub fn compile(self) -> SectionExtractor {
        let groups = self.patterns.len();
        let alternation = self
            .patterns
            .iter()
            .map(|p| format!("({p})"))
            .collect::<Vec<_>>()
            .join("|");
        let source = format!("{HEADER_PREFIX}(?:{alternation}){HEADER_SUFFIX}");

        let headers = match Regex::new(&source) {
            Ok(re) => Some(re),
            Err(e) => {
                // Extraction degrades to "nothing found"; fallbacks take over.
                warn!("Section header pattern failed to compile: {e}");
                None
            }
        };

        SectionExtractor { headers, groups }
    }
}

/// Converts a human label such as `"Next Session Focus"` into a regex fragment.
fn literal_pattern(label: &str) -> String {
    label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[ \t_-]+")
}

/// A compiled set of section labels.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    headers: Option<Regex>,
    groups: usize,
}

impl SectionExtractor {
    /// Finds every header in `text`, in order of appearance.
    pub fn scan<'t>(&self, text: &'t str) -> Sections<'t> {
        let Some(headers) = &self.headers else {
            return Sections {
                text,
                hits: Vec::new(),
            };
        };

        let hits = headers
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let group = (1..=self.groups).find(|&i| caps.get(i).is_some())? - 1;
                Some(Hit {
                    group,
                    header: whole.range(),
                })
            })
            .collect();

        Sections { text, hits }
    }
}

#[derive(Debug, Clone)]
struct Hit {
    group: usize,
    header: Range<usize>,
}

/// The result of scanning one text: every recognized header and the blocks they own.
#[derive(Debug, Clone)]
pub struct Sections<'t> {
    text: &'t str,
    hits: Vec<Hit>,
}

impl<'t> Sections<'t> {
    /// All sections in order of appearance.
    pub fn iter(&self) -> impl Iterator<Item = Section<'t>> + '_ {
        (0..self.hits.len()).map(move |i| self.section_at(i))
    }

    /// The first section whose header belongs to `group`.
    pub fn first(&self, group: usize) -> Option<Section<'t>> {
        self.hits
            .iter()
            .position(|h| h.group == group)
            .map(|i| self.section_at(i))
    }

    /// Text before the first recognized header (the whole text if there is none).
    pub fn preamble(&self) -> &'t str {
        match self.hits.first() {
            Some(hit) => &self.text[..hit.header.start],
            None => self.text,
        }
    }

    fn section_at(&self, index: usize) -> Section<'t> {
        let hit = &self.hits[index];
        let body_end = self
            .hits
            .get(index + 1)
            .map(|next| next.header.start)
            .unwrap_or(self.text.len());

        Section {
            group: hit.group,
            header: &self.text[hit.header.clone()],
            span: hit.header.start..body_end,
            body_start: hit.header.end,
            block: Block {
                text: &self.text[hit.header.end..body_end],
            },
        }
    }
}

/// One labelled section: its header text and the block it owns.
#[derive(Debug, Clone)]
pub struct Section<'t> {
    pub group: usize,
    pub header: &'t str,
    /// Byte range of header plus block within the scanned text.
    pub span: Range<usize>,
    body_start: usize,
    pub block: Block<'t>,
}

impl Section<'_> {
    /// Byte range of the header plus the block's first non-empty line.
    pub fn line_span(&self) -> Range<usize> {
        let raw = self.block.text;
        let leading = raw.len() - raw.trim_start().len();
        let line_len = raw[leading..].find('\n').unwrap_or(raw.len() - leading);
        self.span.start..self.body_start + leading + line_len
    }
}

/// The bounded text belonging to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'t> {
    text: &'t str,
}

impl<'t> Block<'t> {
    pub fn new(text: &'t str) -> Self {
        Self { text }
    }

    pub fn raw(&self) -> &'t str {
        self.text
    }

    /// The block trimmed of surrounding whitespace.
    pub fn as_scalar(&self) -> &'t str {
        self.text.trim()
    }

    /// The first non-empty line, trimmed.
    pub fn first_line(&self) -> &'t str {
        self.text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }

    /// Bullet items (`-`, `*`, `•`) in order, markers and whitespace stripped.
    /// Lines without a bullet marker are ignored.
    pub fn as_list(&self) -> Vec<String> {
        self.text
            .lines()
            .filter_map(strip_bullet)
            .map(str::to_string)
            .collect()
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = if let Some(rest) = trimmed.strip_prefix('•') {
        rest
    } else if trimmed.starts_with("**") || trimmed.starts_with("--") {
        // bold text or a horizontal rule, not a bullet
        return None;
    } else {
        trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('*'))?
    };

    let item = rest.trim();
    (!item.is_empty()).then_some(item)
}

/// Finds the first block labelled `label` in `text`. The block ends at the next
/// bare `Heading:` line or the end of the text.
pub fn find_section<'t>(text: &'t str, label: &str) -> Option<Block<'t>> {
    let extractor = LabelSet::new()
        .label(&[label])
        .pattern(GENERIC_HEADING)
        .compile();
    extractor.scan(text).first(0).map(|s| s.block)
}

/// Prepares provider output for scanning: unifies line endings and removes a
/// surrounding markdown code fence.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    strip_code_fences(&text).to_string()
}

/// Strips a ```` ```lang ... ``` ```` fence wrapping the whole response.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(stripped) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "markdown") on the opening line.
    let body = match stripped.find('\n') {
        Some(newline) => &stripped[newline + 1..],
        None => stripped,
    };
    body.trim_end()
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(body.trim())
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
