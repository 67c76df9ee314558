//! Fixed word lists behind the deterministic category formulas.

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, MatchKind};

/// Job-title tokens for Role Alignment.
pub const JOB_TITLE_TOKENS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "analyst",
    "designer",
    "architect",
    "scientist",
    "consultant",
    "specialist",
    "director",
    "lead",
    "administrator",
];

pub const TECHNICAL_SKILLS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "typescript",
    "c++",
    "c#",
    "golang",
    "rust",
    "ruby",
    "php",
    "sql",
    "react",
    "angular",
    "vue",
    "node.js",
    "django",
    "flask",
    "spring",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "terraform",
    "git",
    "linux",
    "postgresql",
    "mysql",
    "mongodb",
    "redis",
    "graphql",
    "kafka",
    "machine learning",
    "tensorflow",
    "pytorch",
    "ci/cd",
];

pub const SOFT_SKILLS: &[&str] = &[
    "leadership",
    "communication",
    "teamwork",
    "collaboration",
    "problem solving",
    "mentoring",
    "adaptability",
    "critical thinking",
    "time management",
    "creativity",
    "ownership",
    "stakeholder management",
];

/// Impact words for Achievements. Matched as plain substrings.
pub const IMPACT_INDICATORS: &[&str] = &[
    "%", "revenue", "growth", "increase", "saved", "launched", "reduced", "results",
];

/// Section headers Resume Structure expects to find.
pub const SECTION_HEADERS: &[&str] = &[
    "summary",
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
];

/// Case-insensitive multi-term scanner that only accepts whole-word hits.
#[derive(Debug, Clone)]
pub struct TermSet {
    terms: &'static [&'static str],
    matcher: AhoCorasick,
}

impl TermSet {
    pub fn new(terms: &'static [&'static str]) -> Result<Self, aho_corasick::BuildError> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(terms)?;
        Ok(Self { terms, matcher })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Indices of the terms that occur in `text` as whole words.
    pub fn present_in(&self, text: &str) -> HashSet<usize> {
        self.matcher
            .find_iter(text)
            .filter(|m| is_word_bounded(text, m.start(), m.end()))
            .map(|m| m.pattern().as_usize())
            .collect()
    }

    /// Number of terms present in both texts.
    pub fn overlap(&self, a: &str, b: &str) -> usize {
        self.present_in(a).intersection(&self.present_in(b)).count()
    }

    pub fn term(&self, idx: usize) -> &'static str {
        self.terms[idx]
    }
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}
