//! Static vocabularies: synonym table, keyword pattern library, fixed lexicons,
//! section-classifier rules and the category formulas' patterns.
//!
//! Built once at startup by `Vocabulary::load()`, held in `Arc<Vocabulary>` and
//! passed by reference into the pure matching and scoring functions. Nothing in
//! here is mutated after load.

pub mod lexicon;
pub mod patterns;
pub mod synonyms;

use anyhow::{Context, Result};
use regex::Regex;

use crate::matching::sections::SectionRules;
use crate::scoring::categories::CategoryPatterns;

use lexicon::{TermSet, JOB_TITLE_TOKENS, SECTION_HEADERS, SOFT_SKILLS, TECHNICAL_SKILLS};
use patterns::{compile_keyword_patterns, KeywordPattern, CAPITALIZED_TOKEN};
use synonyms::SynonymTable;

#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub synonyms: SynonymTable,
    pub keyword_patterns: Vec<KeywordPattern>,
    pub capitalized_token: Regex,
    pub job_titles: TermSet,
    pub technical_skills: TermSet,
    pub soft_skills: TermSet,
    pub section_headers: TermSet,
    pub section_rules: SectionRules,
    pub category_patterns: CategoryPatterns,
}

impl Vocabulary {
    /// Compiles every table. Any invalid pattern is a startup error.
    pub fn load() -> Result<Self> {
        Ok(Vocabulary {
            synonyms: SynonymTable::builtin(),
            keyword_patterns: compile_keyword_patterns()
                .context("Failed to compile keyword pattern library")?,
            capitalized_token: Regex::new(CAPITALIZED_TOKEN)
                .context("Failed to compile capitalized-token pattern")?,
            job_titles: TermSet::new(JOB_TITLE_TOKENS).context("Failed to build job-title lexicon")?,
            technical_skills: TermSet::new(TECHNICAL_SKILLS)
                .context("Failed to build technical-skill lexicon")?,
            soft_skills: TermSet::new(SOFT_SKILLS).context("Failed to build soft-skill lexicon")?,
            section_headers: TermSet::new(SECTION_HEADERS)
                .context("Failed to build section-header lexicon")?,
            section_rules: SectionRules::compile().context("Failed to compile section rules")?,
            category_patterns: CategoryPatterns::compile()
                .context("Failed to compile category patterns")?,
        })
    }
}
