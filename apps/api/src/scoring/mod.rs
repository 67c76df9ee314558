// Category scoring: ten fixed-budget categories, the degradation ladder that keeps
// them available when the reasoning service misbehaves, and the 0–100 aggregate.

pub mod aggregate;
pub mod categories;
pub mod handlers;
pub mod ladder;
pub mod prompts;

use thiserror::Error;
use tracing::info;

use crate::errors::FailureKind;
use crate::llm_client::{LlmError, ReasoningService};
use crate::matching::resolver::MatchResult;
use crate::matching::{match_keywords, MatchOptions};
use crate::vocabulary::Vocabulary;

use aggregate::ScoreReport;
use ladder::{run_ladder, ScoringInput};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Reasoning service failed: {0}")]
    Service(#[from] LlmError),

    #[error("Service scored {category} at {value}, outside 0..={max}")]
    ServiceOutOfRange {
        category: &'static str,
        value: f64,
        max: u32,
    },

    #[error("Could not compute {category}: {reason}")]
    Compute {
        category: &'static str,
        reason: String,
    },
}

impl ScoringError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScoringError::Service(e) => e.kind(),
            ScoringError::ServiceOutOfRange { .. } => FailureKind::MalformedResponse,
            ScoringError::Compute { .. } => FailureKind::InternalCompute,
        }
    }
}

/// Runs the full scoring pipeline for already-validated inputs.
///
/// `precomputed` is a keyword-match result from an earlier match call; when it is
/// present extraction and resolution are skipped.
pub async fn score_resume(
    job: &str,
    resume: &str,
    precomputed: Option<Vec<MatchResult>>,
    service: &dyn ReasoningService,
    vocab: &Vocabulary,
    options: MatchOptions,
) -> ScoreReport {
    let matches = match precomputed {
        Some(matches) => matches,
        None => match_keywords(job, resume, service, vocab, options).await.keywords,
    };

    let input = ScoringInput {
        job,
        resume,
        matches: &matches,
    };
    // An unconfigured service is absent, not failing: start at the deterministic tier.
    let category_service = (options.service_scoring && service.is_available()).then_some(service);
    let outcome = run_ladder(&input, vocab, category_service).await;

    let report = ScoreReport::from_categories(outcome.categories);
    info!(
        tier = ?outcome.tier,
        keywords = matches.len(),
        "Scored resume: {}/100",
        report.total_score
    );
    report
}
