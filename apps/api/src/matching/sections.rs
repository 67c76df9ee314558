//! Section Classifier: labels a block of resume text with its section type.
//!
//! Scoring is additive: every rule whose pattern matches adds its weight to its
//! label, formatting hints add flat bonuses, and a few compound signals add large
//! ones. CONTENT starts at a floor of 2 so unrecognised text lands there.
//!
//! Ties are broken by `LABEL_PRIORITY`, never by iteration order.

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionLabel {
    Summary,
    Experience,
    Education,
    Skills,
    Additional,
    Projects,
    Awards,
    Content,
    Ignore,
}

/// Tie-break order, highest priority first. A label earlier in this list wins
/// any tie against a label later in it.
pub const LABEL_PRIORITY: [SectionLabel; 9] = [
    SectionLabel::Experience,
    SectionLabel::Education,
    SectionLabel::Skills,
    SectionLabel::Summary,
    SectionLabel::Projects,
    SectionLabel::Awards,
    SectionLabel::Additional,
    SectionLabel::Content,
    SectionLabel::Ignore,
];

/// Labels that receive the short-emphasised-text bonus.
const SUBSTANTIVE_LABELS: [SectionLabel; 7] = [
    SectionLabel::Experience,
    SectionLabel::Education,
    SectionLabel::Skills,
    SectionLabel::Summary,
    SectionLabel::Projects,
    SectionLabel::Awards,
    SectionLabel::Additional,
];

const CONTENT_FLOOR: u32 = 2;
const SHORT_TEXT_CHARS: usize = 50;
const SHORT_EMPHASIS_BONUS: u32 = 3;
const ALL_CAPS_BONUS: u32 = 2;
const TITLE_WITH_YEAR_BONUS: u32 = 8;
const DEGREE_WITH_INSTITUTION_BONUS: u32 = 8;
const COMMA_LIST_BONUS: u32 = 5;
const COMMA_LIST_MIN_COMMAS: usize = 3;
const COMMA_LIST_MAX_CHARS: usize = 200;

/// Ordered (pattern, label, weight) rules.
const RULE_SOURCES: &[(&str, SectionLabel, u32)] = &[
    (
        r"(?i)^\s*(?:professional\s+|career\s+|executive\s+)?(?:summary|profile|objective|about\s+me)\s*:?\s*$",
        SectionLabel::Summary,
        6,
    ),
    (r"(?i)\b(?:summary|objective|profile)\b", SectionLabel::Summary, 3),
    (
        r"(?i)\b(?:passionate|results-driven|seasoned|motivated|dedicated)\b",
        SectionLabel::Summary,
        1,
    ),
    (
        r"(?i)^\s*(?:work\s+|professional\s+|relevant\s+)?(?:experience|employment(?:\s+history)?|work\s+history|career\s+history)\s*:?\s*$",
        SectionLabel::Experience,
        6,
    ),
    (r"(?i)\b(?:experience|employment)\b", SectionLabel::Experience, 2),
    (
        r"(?i)\b(?:managed|led|developed|implemented|built|designed|delivered)\b",
        SectionLabel::Experience,
        1,
    ),
    (
        r"(?i)\b(?:19|20)\d{2}\s*[-\x{2013}\x{2014}]\s*(?:(?:19|20)\d{2}|present|current)\b",
        SectionLabel::Experience,
        3,
    ),
    (
        r"(?i)^\s*(?:education(?:al\s+background)?|academic\s+background|qualifications)\s*:?\s*$",
        SectionLabel::Education,
        6,
    ),
    (
        r"(?i)\b(?:university|college|institute|school)\b",
        SectionLabel::Education,
        3,
    ),
    (
        r"(?i)\b(?:bachelor|master|ph\.?d|mba|degree|diploma|gpa)\b",
        SectionLabel::Education,
        3,
    ),
    (
        r"(?i)^\s*(?:technical\s+|core\s+|key\s+)?(?:skills|competencies|technologies|tech\s+stack)\s*:?\s*$",
        SectionLabel::Skills,
        6,
    ),
    (
        r"(?i)\b(?:skills|proficient|familiar\s+with|frameworks|tools)\b",
        SectionLabel::Skills,
        2,
    ),
    (
        r"(?i)^\s*(?:personal\s+|selected\s+|key\s+|academic\s+)?projects?\s*:?\s*$",
        SectionLabel::Projects,
        6,
    ),
    (
        r"(?i)\b(?:github|open[- ]source|side\s+project|project)\b",
        SectionLabel::Projects,
        2,
    ),
    (
        r"(?i)^\s*(?:awards?|honou?rs|achievements|certifications?|awards\s+(?:and|&)\s+honou?rs)\s*:?\s*$",
        SectionLabel::Awards,
        6,
    ),
    (
        r"(?i)\b(?:award(?:ed)?|honou?r|scholarship|certified|certification|dean's\s+list)\b",
        SectionLabel::Awards,
        2,
    ),
    (
        r"(?i)^\s*(?:additional(?:\s+information)?|other|interests|hobbies|volunteer(?:ing)?|languages|references)\s*:?\s*$",
        SectionLabel::Additional,
        5,
    ),
    (
        r"(?i)\b(?:volunteer|hobbies|interests|references\s+available)\b",
        SectionLabel::Additional,
        2,
    ),
];

const JOB_TITLE_TOKEN: &str = r"(?i)\b(?:engineer|developer|manager|analyst|designer|architect|consultant|intern|director|lead|specialist|scientist)\b";
const YEAR: &str = r"\b(?:19|20)\d{2}\b";
const DEGREE_TOKEN: &str = r"(?i)\b(?:bachelor(?:'s)?|master(?:'s)?|b\.?s\.?c?|b\.?a\.?|m\.?s\.?c?|ph\.?d|mba|associate)\b";
const INSTITUTION_TOKEN: &str = r"(?i)\b(?:university|college|institute|school|academy)\b";
const BARE_YEAR: &str = r"^\d{4}$";
const LONE_GLYPH: &str = r"^[\x{2022}\x{00B7}\x{25AA}\x{25E6}\x{25CF}\x{25A0}\x{25BA}*\-\x{2013}\x{2014}]+$";
const BLOCK_BREAK: &str = r"(?i)</(?:p|h[1-6]|li|div|tr)>|<br\s*/?>";
const HEADING_TAG: &str = r"(?i)<h[1-6][\s>]";
const BOLD_TAG: &str = r"(?i)<(?:b|strong)[\s>]";
const ANY_TAG: &str = r"<[^>]*>";

/// A block of text with the formatting hints available for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBlock {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub heading: bool,
    #[serde(default)]
    pub all_caps: bool,
}

#[cfg(test)]
impl SectionBlock {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct SectionRule {
    pattern: Regex,
    label: SectionLabel,
    weight: u32,
}

/// Compiled classifier rules. Part of the startup vocabulary.
#[derive(Debug, Clone)]
pub struct SectionRules {
    rules: Vec<SectionRule>,
    job_title: Regex,
    year: Regex,
    degree: Regex,
    institution: Regex,
    bare_year: Regex,
    lone_glyph: Regex,
    block_break: Regex,
    heading_tag: Regex,
    bold_tag: Regex,
    any_tag: Regex,
}

impl SectionRules {
    pub fn compile() -> Result<Self, regex::Error> {
        let rules = RULE_SOURCES
            .iter()
            .map(|&(source, label, weight)| {
                Ok(SectionRule {
                    pattern: Regex::new(source)?,
                    label,
                    weight,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(SectionRules {
            rules,
            job_title: Regex::new(JOB_TITLE_TOKEN)?,
            year: Regex::new(YEAR)?,
            degree: Regex::new(DEGREE_TOKEN)?,
            institution: Regex::new(INSTITUTION_TOKEN)?,
            bare_year: Regex::new(BARE_YEAR)?,
            lone_glyph: Regex::new(LONE_GLYPH)?,
            block_break: Regex::new(BLOCK_BREAK)?,
            heading_tag: Regex::new(HEADING_TAG)?,
            bold_tag: Regex::new(BOLD_TAG)?,
            any_tag: Regex::new(ANY_TAG)?,
        })
    }

    /// Splits plain text or HTML into one block per line, deriving formatting
    /// hints from heading/bold tags and from trailing colons.
    pub fn blocks_from_document(&self, document: &str) -> Vec<SectionBlock> {
        let with_breaks = self.block_break.replace_all(document, "\n");

        with_breaks
            .lines()
            .filter_map(|line| {
                let heading_tag = self.heading_tag.is_match(line);
                let bold = self.bold_tag.is_match(line);
                let text = self.any_tag.replace_all(line, "").trim().to_string();
                if text.is_empty() {
                    return None;
                }
                let heading = heading_tag || (text.ends_with(':') && text.chars().count() <= SHORT_TEXT_CHARS);
                Some(SectionBlock {
                    text,
                    bold,
                    heading,
                    all_caps: false,
                })
            })
            .collect()
    }
}

/// Labels one block.
pub fn classify_section(block: &SectionBlock, rules: &SectionRules) -> SectionLabel {
    match label_scores(block, rules) {
        None => SectionLabel::Ignore,
        Some(scores) => pick_label(&scores),
    }
}

/// Per-label scores indexed like `LABEL_PRIORITY`; `None` when the block is
/// short-circuited to IGNORE.
fn label_scores(block: &SectionBlock, rules: &SectionRules) -> Option<[u32; 9]> {
    let text = block.text.trim();
    let non_space = text.chars().filter(|c| !c.is_whitespace()).count();
    if non_space < 2 || rules.bare_year.is_match(text) || rules.lone_glyph.is_match(text) {
        return None;
    }

    let mut scores = [0u32; 9];
    let mut add = |label: SectionLabel, weight: u32| scores[priority_index(label)] += weight;

    add(SectionLabel::Content, CONTENT_FLOOR);

    for rule in &rules.rules {
        if rule.pattern.is_match(text) {
            add(rule.label, rule.weight);
        }
    }

    let char_count = text.chars().count();
    if char_count <= SHORT_TEXT_CHARS && (block.bold || block.heading) {
        let caps = block.all_caps || is_all_caps(text);
        let bonus = SHORT_EMPHASIS_BONUS + if caps { ALL_CAPS_BONUS } else { 0 };
        for label in SUBSTANTIVE_LABELS {
            add(label, bonus);
        }
    }

    if rules.job_title.is_match(text) && rules.year.is_match(text) {
        add(SectionLabel::Experience, TITLE_WITH_YEAR_BONUS);
    }
    if rules.degree.is_match(text) && rules.institution.is_match(text) {
        add(SectionLabel::Education, DEGREE_WITH_INSTITUTION_BONUS);
    }
    if char_count < COMMA_LIST_MAX_CHARS && text.matches(',').count() >= COMMA_LIST_MIN_COMMAS {
        add(SectionLabel::Skills, COMMA_LIST_BONUS);
    }

    Some(scores)
}

/// Highest score wins; on a tie the label earlier in `LABEL_PRIORITY` wins.
fn pick_label(scores: &[u32; 9]) -> SectionLabel {
    let mut best = 0;
    for idx in 1..LABEL_PRIORITY.len() {
        if scores[idx] > scores[best] {
            best = idx;
        }
    }
    LABEL_PRIORITY[best]
}

fn priority_index(label: SectionLabel) -> usize {
    LABEL_PRIORITY
        .iter()
        .position(|&l| l == label)
        .unwrap_or(LABEL_PRIORITY.len() - 1)
}

fn is_all_caps(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| c.is_uppercase())
}
