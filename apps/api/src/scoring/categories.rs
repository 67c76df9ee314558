//! The ten scoring categories and their deterministic formulas.
//!
//! Every formula returns `Result<CategoryScore, ScoringError>`; a non-finite or
//! negative intermediate is an internal compute error rather than a silent 0.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::matching::resolver::MatchResult;
use crate::matching::sections::{classify_section, SectionLabel};
use crate::scoring::ScoringError;
use crate::vocabulary::lexicon::IMPACT_INDICATORS;
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    KeywordMatch,
    RoleAlignment,
    SkillsMatch,
    Achievements,
    ExperienceLevel,
    ResumeStructure,
    Customization,
    FormatCompatibility,
    GrammarSpelling,
    VisualAppeal,
}

impl Category {
    /// Report order.
    pub const ALL: [Category; 10] = [
        Category::KeywordMatch,
        Category::RoleAlignment,
        Category::SkillsMatch,
        Category::Achievements,
        Category::ExperienceLevel,
        Category::ResumeStructure,
        Category::Customization,
        Category::FormatCompatibility,
        Category::GrammarSpelling,
        Category::VisualAppeal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::KeywordMatch => "Keyword Match",
            Category::RoleAlignment => "Role Alignment",
            Category::SkillsMatch => "Skills Match",
            Category::Achievements => "Achievements",
            Category::ExperienceLevel => "Experience Level",
            Category::ResumeStructure => "Resume Structure",
            Category::Customization => "Customization",
            Category::FormatCompatibility => "Format Compatibility",
            Category::GrammarSpelling => "Grammar & Spelling",
            Category::VisualAppeal => "Visual Appeal",
        }
    }

    /// Fixed point budget. The ten budgets sum to 100.
    pub fn max(self) -> u32 {
        match self {
            Category::KeywordMatch => 20,
            Category::RoleAlignment | Category::SkillsMatch => 15,
            Category::Achievements
            | Category::ExperienceLevel
            | Category::ResumeStructure
            | Category::Customization => 10,
            Category::FormatCompatibility => 5,
            Category::GrammarSpelling => 3,
            Category::VisualAppeal => 2,
        }
    }

    /// Midpoint substituted when the category could not be computed.
    pub fn neutral(self) -> u32 {
        self.max() / 2
    }
}

/// One scored category as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    pub max: u32,
    pub score: u32,
}

impl CategoryScore {
    pub fn new(category: Category, score: u32) -> Self {
        Self {
            name: category.name().to_string(),
            max: category.max(),
            score: score.min(category.max()),
        }
    }

    pub fn neutral(category: Category) -> Self {
        Self::new(category, category.neutral())
    }

    pub fn is(&self, category: Category) -> bool {
        self.name == category.name()
    }
}

/// Rounds a raw formula value into the category's budget.
pub(crate) fn bounded(category: Category, raw: f64) -> Result<CategoryScore, ScoringError> {
    if !raw.is_finite() || raw < 0.0 {
        return Err(ScoringError::Compute {
            category: category.name(),
            reason: format!("formula produced {raw}"),
        });
    }
    Ok(CategoryScore::new(category, raw.round().min(category.max() as f64) as u32))
}

/// Ratio guarded against an empty denominator.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Compiled patterns for the text-inspection categories
// ────────────────────────────────────────────────────────────────────────────

const EXPERIENCE_YEARS: &str = r"(?i)\b(\d{1,2})\s*\+?\s*(?:years?|yrs)\b";
const PARAGRAPH_BREAK: &str = r"\n[ \t]*\n";

const FORMAT_RED_FLAGS: &[(&str, &str)] = &[
    ("pipe", r"\|"),
    ("bullet_glyph", r"[\x{2022}\x{25CF}\x{25AA}\x{25E6}\x{25A0}\x{25BA}]"),
    ("bracket", r"\[[^\]\n]*\]"),
    ("tag", r"</?[A-Za-z][^>]*>"),
    ("tab", r"\t"),
    ("non_ascii", r"[^\x00-\x7F]"),
];

const GRAMMAR_ANOMALIES: &[(&str, &str)] = &[
    ("double_space", r"\S {2,}\S"),
    ("missing_space_after_sentence", r"[a-z][.!?][A-Z]"),
    ("space_before_punctuation", r"\w +[,;:!?]|\w +\.(?:\s|$)"),
    ("lowercase_i", r"(?:^|\s)i(?:\s|$|[,.;:!?'])"),
];

#[derive(Debug, Clone)]
pub struct CategoryPatterns {
    experience_years: Regex,
    paragraph_break: Regex,
    format_red_flags: Vec<(&'static str, Regex)>,
    grammar_anomalies: Vec<(&'static str, Regex)>,
}

impl CategoryPatterns {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(CategoryPatterns {
            experience_years: Regex::new(EXPERIENCE_YEARS)?,
            paragraph_break: Regex::new(PARAGRAPH_BREAK)?,
            format_red_flags: compile_named(FORMAT_RED_FLAGS)?,
            grammar_anomalies: compile_named(GRAMMAR_ANOMALIES)?,
        })
    }

    fn first_years(&self, text: &str) -> Option<u32> {
        self.experience_years
            .captures(text)
            .and_then(|c| c[1].parse::<u32>().ok())
    }
}

fn compile_named(
    sources: &[(&'static str, &'static str)],
) -> Result<Vec<(&'static str, Regex)>, regex::Error> {
    sources
        .iter()
        .map(|&(name, source)| Ok((name, Regex::new(source)?)))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Formulas
// ────────────────────────────────────────────────────────────────────────────

/// round(20 · matched / total); no keywords ⇒ 0. Rejects results whose fields
/// contradict each other, which can only arrive through a precomputed match.
pub fn keyword_match(matches: &[MatchResult]) -> Result<CategoryScore, ScoringError> {
    let category = Category::KeywordMatch;
    if let Some(bad) = matches.iter().find(|m| !m.is_consistent()) {
        return Err(ScoringError::Compute {
            category: category.name(),
            reason: format!("inconsistent match result for '{}'", bad.keyword),
        });
    }
    let matched = matches.iter().filter(|m| m.found).count();
    bounded(category, category.max() as f64 * ratio(matched, matches.len()))
}

/// Job-title tokens shared by both texts against min(5, vocabulary size).
pub fn role_alignment(job: &str, resume: &str, vocab: &Vocabulary) -> Result<CategoryScore, ScoringError> {
    let category = Category::RoleAlignment;
    let hits = vocab.job_titles.overlap(job, resume);
    let denominator = vocab.job_titles.len().min(5);
    bounded(category, category.max() as f64 * ratio(hits, denominator))
}

/// 0.7 · technical overlap + 0.3 · soft-skill overlap, relative to what the job asks for.
pub fn skills_match(job: &str, resume: &str, vocab: &Vocabulary) -> Result<CategoryScore, ScoringError> {
    let category = Category::SkillsMatch;

    let job_technical = vocab.technical_skills.present_in(job);
    let job_soft = vocab.soft_skills.present_in(job);
    let technical_overlap = job_technical
        .intersection(&vocab.technical_skills.present_in(resume))
        .count();
    let soft_overlap = job_soft
        .intersection(&vocab.soft_skills.present_in(resume))
        .count();

    let weighted = 0.7 * technical_overlap as f64 + 0.3 * soft_overlap as f64;
    let max_weighted = 0.7 * job_technical.len() as f64 + 0.3 * job_soft.len() as f64;
    if max_weighted == 0.0 {
        return Ok(CategoryScore::new(category, 0));
    }
    bounded(category, category.max() as f64 * weighted / max_weighted)
}

/// Impact indicators present in the resume, out of eight.
pub fn achievements(resume: &str) -> Result<CategoryScore, ScoringError> {
    let category = Category::Achievements;
    let resume_lower = resume.to_lowercase();
    let hits = IMPACT_INDICATORS
        .iter()
        .filter(|indicator| resume_lower.contains(*indicator))
        .count();
    bounded(category, category.max() as f64 * ratio(hits, IMPACT_INDICATORS.len()))
}

/// Compares the first "N years" figure of each text. Missing on either side ⇒ 5.
pub fn experience_level(job: &str, resume: &str, vocab: &Vocabulary) -> Result<CategoryScore, ScoringError> {
    let category = Category::ExperienceLevel;
    let patterns = &vocab.category_patterns;

    let (job_years, resume_years) = match (patterns.first_years(job), patterns.first_years(resume)) {
        (Some(j), Some(r)) => (j, r),
        _ => return Ok(CategoryScore::new(category, 5)),
    };

    let score = if job_years == 0 {
        10
    } else {
        let r = resume_years as f64 / job_years as f64;
        if r >= 1.0 {
            10
        } else if r >= 0.8 {
            8
        } else if r >= 0.6 {
            6
        } else {
            4
        }
    };
    Ok(CategoryScore::new(category, score))
}

/// Expected section headers found, out of six. A header counts when its word
/// appears in the resume or the classifier recognises a heading line for it.
pub fn resume_structure(resume: &str, vocab: &Vocabulary) -> Result<CategoryScore, ScoringError> {
    let category = Category::ResumeStructure;
    let headers = &vocab.section_headers;
    let mut found = headers.present_in(resume);

    for block in vocab.section_rules.blocks_from_document(resume) {
        if !(block.heading || block.bold) {
            continue;
        }
        if let Some(header) = header_for_label(classify_section(&block, &vocab.section_rules)) {
            if let Some(idx) = (0..headers.len()).find(|&i| headers.term(i) == header) {
                found.insert(idx);
            }
        }
    }

    bounded(category, category.max() as f64 * ratio(found.len(), headers.len()))
}

fn header_for_label(label: SectionLabel) -> Option<&'static str> {
    match label {
        SectionLabel::Summary => Some("summary"),
        SectionLabel::Experience => Some("experience"),
        SectionLabel::Education => Some("education"),
        SectionLabel::Skills => Some("skills"),
        SectionLabel::Projects => Some("projects"),
        SectionLabel::Awards => Some("certifications"),
        SectionLabel::Additional | SectionLabel::Content | SectionLabel::Ignore => None,
    }
}

/// Share of the job's distinct word tokens that also appear in the resume.
pub fn customization(job: &str, resume: &str) -> Result<CategoryScore, ScoringError> {
    let category = Category::Customization;
    let job_tokens = word_tokens(job);
    let resume_tokens = word_tokens(resume);
    let shared = job_tokens.intersection(&resume_tokens).count();
    bounded(category, category.max() as f64 * ratio(shared, job_tokens.len()))
}

fn word_tokens(text: &str) -> HashSet<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// 5 minus the number of distinct formatting red flags present.
pub fn format_compatibility(resume: &str, vocab: &Vocabulary) -> Result<CategoryScore, ScoringError> {
    let flags = names_present(&vocab.category_patterns.format_red_flags, resume);
    if !flags.is_empty() {
        debug!(?flags, "Formatting red flags");
    }
    Ok(CategoryScore::new(
        Category::FormatCompatibility,
        5u32.saturating_sub(flags.len() as u32),
    ))
}

/// 3 minus the number of distinct text anomalies present.
pub fn grammar_spelling(resume: &str, vocab: &Vocabulary) -> Result<CategoryScore, ScoringError> {
    let anomalies = names_present(&vocab.category_patterns.grammar_anomalies, resume);
    if !anomalies.is_empty() {
        debug!(?anomalies, "Text anomalies");
    }
    Ok(CategoryScore::new(
        Category::GrammarSpelling,
        3u32.saturating_sub(anomalies.len() as u32),
    ))
}

fn names_present(patterns: &[(&'static str, Regex)], text: &str) -> Vec<&'static str> {
    patterns
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| *name)
        .collect()
}

/// 2 with at least one blank-line paragraph break, else 1.
pub fn visual_appeal(resume: &str, vocab: &Vocabulary) -> Result<CategoryScore, ScoringError> {
    let score = if vocab.category_patterns.paragraph_break.is_match(resume) {
        2
    } else {
        1
    };
    Ok(CategoryScore::new(Category::VisualAppeal, score))
}
