//! Category-tagged regex library for the fallback keyword extractor.

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    Language,
    Framework,
    Database,
    CloudPlatform,
    ToolOrMethodology,
    SoftSkill,
    Certification,
    ExperienceDuration,
    Domain,
}

/// One compiled library entry.
#[derive(Debug, Clone)]
pub struct KeywordPattern {
    pub category: KeywordCategory,
    pub regex: Regex,
}

const PATTERN_SOURCES: &[(KeywordCategory, &str)] = &[
    (
        KeywordCategory::Language,
        r"(?i)\b(?:javascript|typescript|python|java|golang|rust|ruby|php|swift|kotlin|scala|perl|sql)\b",
    ),
    (KeywordCategory::Language, r"(?i)\bc(?:\+\+|#)"),
    (
        KeywordCategory::Framework,
        r"(?i)\b(?:react(?:\.js)?|angular|vue(?:\.js)?|next\.js|node\.js|django|flask|fastapi|spring boot|spring|express|ruby on rails|rails|asp\.net|tensorflow|pytorch|pandas|numpy|scikit-learn)\b",
    ),
    (
        KeywordCategory::Database,
        r"(?i)\b(?:postgresql|postgres|mysql|mongodb|redis|oracle|sql server|dynamodb|elasticsearch|sqlite|cassandra|snowflake)\b",
    ),
    (
        KeywordCategory::CloudPlatform,
        r"(?i)\b(?:aws|amazon web services|azure|gcp|google cloud|heroku|cloudflare)\b",
    ),
    (
        KeywordCategory::ToolOrMethodology,
        r"(?i)\b(?:docker|kubernetes|terraform|ansible|jenkins|github|gitlab|git|ci/cd|jira|agile|scrum|kanban|devops|microservices|restful apis?|rest apis?|graphql|linux|kafka|airflow)\b",
    ),
    (
        KeywordCategory::SoftSkill,
        r"(?i)\b(?:leadership|communication|teamwork|problem[- ]solving|collaboration|mentoring|critical thinking|time management|stakeholder management)\b",
    ),
    (
        KeywordCategory::Certification,
        r"(?i)\b(?:pmp|cissp|cpa|cfa|aws certified|certified scrum master|mba|ph\.?d)\b",
    ),
    (
        KeywordCategory::Certification,
        r"(?i)\b(?:bachelor|master)(?:'|\x{2019})?s(?:\s+degree)?\b",
    ),
    (
        KeywordCategory::ExperienceDuration,
        r"(?i)\b\d+\+?\s*(?:years?|yrs)\b",
    ),
    (
        KeywordCategory::Domain,
        r"(?i)\b(?:machine learning|artificial intelligence|deep learning|data science|data analysis|natural language processing|computer vision|distributed systems|cloud computing|cybersecurity|fintech|healthcare|e-commerce|blockchain)\b",
    ),
];

/// Compiles the whole library. Fails on the first invalid pattern.
pub fn compile_keyword_patterns() -> Result<Vec<KeywordPattern>, regex::Error> {
    PATTERN_SOURCES
        .iter()
        .map(|(category, source)| {
            Ok(KeywordPattern {
                category: *category,
                regex: Regex::new(source)?,
            })
        })
        .collect()
}

/// Candidate proper-noun technology: a capitalized token, optionally with a
/// `++`/`#` suffix or a `.js` tail.
pub const CAPITALIZED_TOKEN: &str = r"\b[A-Z][A-Za-z0-9]*(?:\+\+|#|\.js)?";

/// Capitalized words that are ordinary English in job postings.
pub const CAPITALIZED_STOPLIST: &[&str] = &[
    "a", "an", "the", "and", "or", "we", "you", "our", "your", "us", "they", "this", "that",
    "these", "those", "i", "it", "in", "on", "of", "for", "to", "with", "as", "at", "by",
    "from", "is", "are", "be", "will", "must", "should", "can", "may", "if", "all", "any",
    "about", "requirements", "required", "preferred", "responsibilities", "qualifications",
    "experience", "skills", "role", "team", "job", "position", "company", "years", "year",
    "senior", "junior", "mid", "level", "strong", "excellent", "ability", "knowledge",
    "bonus", "plus", "nice", "have", "equal", "opportunity", "employer", "benefits",
    "location", "remote", "hybrid", "full", "time", "salary", "monday", "tuesday",
    "wednesday", "thursday", "friday", "january", "february", "march", "april", "june",
    "july", "august", "september", "october", "november", "december",
];
