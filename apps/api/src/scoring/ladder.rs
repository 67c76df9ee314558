//! Degradation ladder for category scoring.
//!
//! | Tier          | Categories                                   | Entered when                         |
//! |---------------|----------------------------------------------|--------------------------------------|
//! | ServiceBacked | all ten, Role/Skills from the service        | a service is available               |
//! | Deterministic | all ten, Role/Skills from vocabulary overlap | service quota exhausted, or disabled |
//! | Basic         | Keyword Match, Resume Structure, Format      | any other service failure            |
//! | Neutral       | all ten, failures at their midpoint          | everything above failed              |
//!
//! `run_ladder` always returns a report; failures are logged with their kind and
//! never reach the caller.

use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::FailureKind;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{call_json, ReasoningService};
use crate::matching::resolver::MatchResult;
use crate::scoring::categories::{self, Category, CategoryScore};
use crate::scoring::prompts::CATEGORY_ASSESSMENT_PROMPT_TEMPLATE;
use crate::scoring::ScoringError;
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringTier {
    ServiceBacked,
    Deterministic,
    Basic,
    Neutral,
}

/// Everything the category formulas read.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub job: &'a str,
    pub resume: &'a str,
    pub matches: &'a [MatchResult],
}

#[derive(Debug)]
pub struct LadderOutcome {
    pub categories: Vec<CategoryScore>,
    pub tier: ScoringTier,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceAssessment {
    role_alignment: f64,
    skills_match: f64,
    #[serde(default)]
    rationale: String,
}

/// Scores every category, walking down the tiers until one succeeds.
/// `service = None` starts at the deterministic tier.
pub async fn run_ladder(
    input: &ScoringInput<'_>,
    vocab: &Vocabulary,
    service: Option<&dyn ReasoningService>,
) -> LadderOutcome {
    let mut quota_only = true;

    if let Some(service) = service {
        match service_backed(input, vocab, service).await {
            Ok(categories) => return outcome(categories, ScoringTier::ServiceBacked),
            Err(e) => {
                warn!(kind = %e.kind(), "Service-backed scoring failed: {e}");
                quota_only = e.kind() == FailureKind::QuotaExceeded;
            }
        }
    }

    if quota_only {
        match deterministic(input, vocab) {
            Ok(categories) => return outcome(categories, ScoringTier::Deterministic),
            Err(e) => warn!(kind = %e.kind(), "Deterministic scoring failed: {e}"),
        }
    }

    match basic(input, vocab) {
        Ok(categories) => outcome(categories, ScoringTier::Basic),
        Err(e) => {
            warn!(kind = %e.kind(), "Basic scoring failed, filling with neutral scores: {e}");
            outcome(neutral_fill(input, vocab), ScoringTier::Neutral)
        }
    }
}

fn outcome(categories: Vec<CategoryScore>, tier: ScoringTier) -> LadderOutcome {
    LadderOutcome { categories, tier }
}

async fn service_backed(
    input: &ScoringInput<'_>,
    vocab: &Vocabulary,
    service: &dyn ReasoningService,
) -> Result<Vec<CategoryScore>, ScoringError> {
    let prompt = CATEGORY_ASSESSMENT_PROMPT_TEMPLATE
        .replace("{jd_text}", input.job)
        .replace("{resume_text}", input.resume);
    let assessment: ServiceAssessment = call_json(service, &prompt, JSON_ONLY_SYSTEM).await?;
    if !assessment.rationale.is_empty() {
        info!(rationale = %assessment.rationale, "Service category assessment");
    }

    let role = service_score(Category::RoleAlignment, assessment.role_alignment)?;
    let skills = service_score(Category::SkillsMatch, assessment.skills_match)?;
    full_report(input, vocab, role, skills)
}

/// Out-of-range service values are a malformed reply, not something to clamp.
fn service_score(category: Category, value: f64) -> Result<CategoryScore, ScoringError> {
    if !value.is_finite() || value < 0.0 || value > category.max() as f64 {
        return Err(ScoringError::ServiceOutOfRange {
            category: category.name(),
            value,
            max: category.max(),
        });
    }
    Ok(CategoryScore::new(category, value.round() as u32))
}

fn deterministic(
    input: &ScoringInput<'_>,
    vocab: &Vocabulary,
) -> Result<Vec<CategoryScore>, ScoringError> {
    let role = categories::role_alignment(input.job, input.resume, vocab)?;
    let skills = categories::skills_match(input.job, input.resume, vocab)?;
    full_report(input, vocab, role, skills)
}

fn full_report(
    input: &ScoringInput<'_>,
    vocab: &Vocabulary,
    role: CategoryScore,
    skills: CategoryScore,
) -> Result<Vec<CategoryScore>, ScoringError> {
    Category::ALL
        .iter()
        .map(|&category| match category {
            Category::RoleAlignment => Ok(role.clone()),
            Category::SkillsMatch => Ok(skills.clone()),
            other => compute_one(other, input, vocab),
        })
        .collect()
}

fn basic(input: &ScoringInput<'_>, vocab: &Vocabulary) -> Result<Vec<CategoryScore>, ScoringError> {
    [
        Category::KeywordMatch,
        Category::ResumeStructure,
        Category::FormatCompatibility,
    ]
    .into_iter()
    .map(|category| compute_one(category, input, vocab))
    .collect()
}

/// Computes each category on its own; whatever fails gets its midpoint.
fn neutral_fill(input: &ScoringInput<'_>, vocab: &Vocabulary) -> Vec<CategoryScore> {
    let computed = Category::ALL
        .iter()
        .filter_map(|&category| match compute_one(category, input, vocab) {
            Ok(score) => Some(score),
            Err(e) => {
                warn!(kind = %e.kind(), "{} falls back to neutral: {e}", category.name());
                None
            }
        })
        .collect();
    complete_with_neutral(computed)
}

/// Returns all ten categories in report order, taking scores from `partial`
/// where present and the neutral midpoint elsewhere.
pub fn complete_with_neutral(partial: Vec<CategoryScore>) -> Vec<CategoryScore> {
    Category::ALL
        .iter()
        .map(|&category| {
            partial
                .iter()
                .find(|s| s.is(category))
                .cloned()
                .unwrap_or_else(|| CategoryScore::neutral(category))
        })
        .collect()
}

fn compute_one(
    category: Category,
    input: &ScoringInput<'_>,
    vocab: &Vocabulary,
) -> Result<CategoryScore, ScoringError> {
    let ScoringInput {
        job,
        resume,
        matches,
    } = *input;
    match category {
        Category::KeywordMatch => categories::keyword_match(matches),
        Category::RoleAlignment => categories::role_alignment(job, resume, vocab),
        Category::SkillsMatch => categories::skills_match(job, resume, vocab),
        Category::Achievements => categories::achievements(resume),
        Category::ExperienceLevel => categories::experience_level(job, resume, vocab),
        Category::ResumeStructure => categories::resume_structure(resume, vocab),
        Category::Customization => categories::customization(job, resume),
        Category::FormatCompatibility => categories::format_compatibility(resume, vocab),
        Category::GrammarSpelling => categories::grammar_spelling(resume, vocab),
        Category::VisualAppeal => categories::visual_appeal(resume, vocab),
    }
}
