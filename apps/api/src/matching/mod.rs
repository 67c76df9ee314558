// Keyword matching: extraction from the job description, three-tier resolution
// against the resume, and the heuristic resume section classifier.
// All reasoning-service calls go through llm_client.

pub mod handlers;
pub mod keywords;
pub mod prompts;
pub mod resolver;
pub mod sections;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::ReasoningService;
use crate::vocabulary::Vocabulary;

use keywords::extract_keywords;
use resolver::{match_score, resolve_all, MatchResult};

/// Feature switches read from `Config` for one request.
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    pub semantic_matching: bool,
    pub service_scoring: bool,
}

impl From<&Config> for MatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            semantic_matching: config.enable_semantic_matching,
            service_scoring: config.enable_llm_category_scoring,
        }
    }
}

/// Keyword-match result: one entry per extracted keyword plus the found percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub keywords: Vec<MatchResult>,
    /// Recomputed by scoring, so callers may omit it.
    #[serde(default)]
    pub score: u32,
}

/// Extracts keywords from `job` and resolves each against `resume`.
pub async fn match_keywords(
    job: &str,
    resume: &str,
    service: &dyn ReasoningService,
    vocab: &Vocabulary,
    options: MatchOptions,
) -> MatchReport {
    let keywords = extract_keywords(job, service, vocab).await;
    let semantic = (options.semantic_matching && service.is_available()).then_some(service);
    let results = resolve_all(&keywords, resume, vocab, semantic).await;
    let score = match_score(&results);

    info!(
        keywords = results.len(),
        found = results.iter().filter(|r| r.found).count(),
        "Keyword match: {score}%"
    );

    MatchReport {
        keywords: results,
        score,
    }
}

/// Rejects a missing or whitespace-only text field.
pub fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}
