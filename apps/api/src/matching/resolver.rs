//! Match Resolver: decides whether one keyword is present in a resume.
//!
//! Tiers run strictly in order and stop at the first hit:
//! 1. direct  : literal keyword, case-insensitive substring  → confidence 1.0
//! 2. synonym : any variant of the keyword's canonical form  → confidence 0.9
//! 3. semantic: reasoning service judgement (feature-flagged) → service confidence
//!
//! A failing semantic call degrades to `MatchType::None`; it never propagates.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::FailureKind;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{call_json, LlmError, ReasoningService};
use crate::matching::keywords::Keyword;
use crate::matching::prompts::SEMANTIC_MATCH_PROMPT_TEMPLATE;
use crate::vocabulary::synonyms::{normalize_term, SynonymTable};
use crate::vocabulary::Vocabulary;

pub const DIRECT_CONFIDENCE: f64 = 1.0;
pub const SYNONYM_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Direct,
    Synonym,
    Semantic,
    None,
}

/// Outcome for one keyword. `MatchType::None` always carries `found = false` and
/// `confidence = 0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub keyword: String,
    pub found: bool,
    pub match_type: MatchType,
    pub confidence: f64,
    pub explanation: String,
}

impl MatchResult {
    fn direct(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            found: true,
            match_type: MatchType::Direct,
            confidence: DIRECT_CONFIDENCE,
            explanation: format!("'{keyword}' appears in the resume"),
        }
    }

    fn synonym(keyword: &str, variant: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            found: true,
            match_type: MatchType::Synonym,
            confidence: SYNONYM_CONFIDENCE,
            explanation: format!("Resume uses '{variant}', an equivalent of '{keyword}'"),
        }
    }

    fn semantic(keyword: &str, confidence: f64, explanation: String) -> Self {
        Self {
            keyword: keyword.to_string(),
            found: true,
            match_type: MatchType::Semantic,
            confidence,
            explanation,
        }
    }

    pub fn none(keyword: &str, explanation: impl Into<String>) -> Self {
        Self {
            keyword: keyword.to_string(),
            found: false,
            match_type: MatchType::None,
            confidence: 0.0,
            explanation: explanation.into(),
        }
    }

    /// `found` agrees with `match_type` and confidence sits in [0, 1] (0 when not found).
    pub fn is_consistent(&self) -> bool {
        let confidence_ok = (0.0..=1.0).contains(&self.confidence);
        match self.match_type {
            MatchType::None => !self.found && self.confidence == 0.0,
            _ => self.found && confidence_ok,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SemanticReply {
    matched: bool,
    confidence: f64,
    #[serde(default)]
    explanation: String,
}

/// Resolves every keyword concurrently. Output order follows `keywords`.
pub async fn resolve_all(
    keywords: &[Keyword],
    resume_text: &str,
    vocab: &Vocabulary,
    semantic: Option<&dyn ReasoningService>,
) -> Vec<MatchResult> {
    join_all(
        keywords
            .iter()
            .map(|k| resolve_match(&k.text, resume_text, vocab, semantic)),
    )
    .await
}

/// Runs the three tiers for one keyword. `semantic = None` disables tier 3.
pub async fn resolve_match(
    keyword: &str,
    resume_text: &str,
    vocab: &Vocabulary,
    semantic: Option<&dyn ReasoningService>,
) -> MatchResult {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return MatchResult::none(keyword, "Empty keyword");
    }

    let resume_lower = normalize_term(resume_text);

    if let Some(hit) = direct_tier(keyword, &resume_lower)
        .or_else(|| synonym_tier(keyword, &resume_lower, &vocab.synonyms))
    {
        return hit;
    }

    match semantic {
        Some(service) => semantic_tier(keyword, resume_text, service).await,
        None => MatchResult::none(keyword, "No direct or synonym match in resume"),
    }
}

fn direct_tier(keyword: &str, resume_lower: &str) -> Option<MatchResult> {
    resume_lower
        .contains(&normalize_term(keyword))
        .then(|| MatchResult::direct(keyword))
}

fn synonym_tier(keyword: &str, resume_lower: &str, synonyms: &SynonymTable) -> Option<MatchResult> {
    let literal = normalize_term(keyword);
    let group = synonyms.group_for(&literal)?;
    group
        .forms()
        .filter(|form| *form != literal)
        .find(|form| resume_lower.contains(form))
        .map(|form| MatchResult::synonym(keyword, form))
}

async fn semantic_tier(
    keyword: &str,
    resume_text: &str,
    service: &dyn ReasoningService,
) -> MatchResult {
    match ask_service(keyword, resume_text, service).await {
        Ok(reply) if reply.matched => match bound_confidence(reply.confidence) {
            Some(confidence) => MatchResult::semantic(keyword, confidence, reply.explanation),
            None => {
                warn!(kind = %FailureKind::MalformedResponse, "Semantic match for '{keyword}' had confidence {}", reply.confidence);
                MatchResult::none(keyword, "Semantic match unavailable")
            }
        },
        Ok(reply) => MatchResult::none(keyword, reply.explanation),
        Err(e) => {
            warn!(kind = %e.kind(), "Semantic match for '{keyword}' failed: {e}");
            MatchResult::none(keyword, "Semantic match unavailable")
        }
    }
}

async fn ask_service(
    keyword: &str,
    resume_text: &str,
    service: &dyn ReasoningService,
) -> Result<SemanticReply, LlmError> {
    let prompt = SEMANTIC_MATCH_PROMPT_TEMPLATE
        .replace("{keyword}", keyword)
        .replace("{resume_text}", resume_text);
    call_json(service, &prompt, JSON_ONLY_SYSTEM).await
}

/// Service confidence is clamped into [0, 1]; a non-finite value is rejected.
fn bound_confidence(raw: f64) -> Option<f64> {
    raw.is_finite().then(|| raw.clamp(0.0, 1.0))
}

/// Percentage of keywords found, rounded. No keywords ⇒ 0.
pub fn match_score(results: &[MatchResult]) -> u32 {
    if results.is_empty() {
        return 0;
    }
    let found = results.iter().filter(|r| r.found).count();
    (100.0 * found as f64 / results.len() as f64).round() as u32
}
