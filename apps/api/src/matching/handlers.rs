//! Axum route handlers for keyword matching and section classification.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::sections::{classify_section, SectionBlock, SectionLabel};
use crate::matching::{match_keywords, require_text, MatchOptions, MatchReport};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub resume_content: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub blocks: Vec<SectionBlock>,
    /// Raw resume text or HTML, split into blocks server-side.
    #[serde(default)]
    pub document: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassifiedSection {
    pub text: String,
    pub label: SectionLabel,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub sections: Vec<ClassifiedSection>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/match
///
/// Extracts keywords from the job description and reports which ones the resume
/// covers. Service failures degrade inside the pipeline; only empty input errors.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchReport>, AppError> {
    require_text("jobDescription", &request.job_description)?;
    require_text("resumeContent", &request.resume_content)?;

    let span = info_span!("match", request_id = %Uuid::new_v4());
    let report = match_keywords(
        &request.job_description,
        &request.resume_content,
        state.llm.as_ref(),
        &state.vocab,
        MatchOptions::from(&state.config),
    )
    .instrument(span)
    .await;

    Ok(Json(report))
}

/// POST /api/v1/sections/classify
///
/// Labels each block with its resume section. Accepts pre-split blocks with
/// formatting hints, or a whole `document` to split first.
pub async fn handle_classify_sections(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let rules = &state.vocab.section_rules;
    let blocks = match request.document {
        Some(document) if request.blocks.is_empty() => {
            require_text("document", &document)?;
            rules.blocks_from_document(&document)
        }
        _ => request.blocks,
    };
    if blocks.is_empty() {
        return Err(AppError::Validation("blocks cannot be empty".to_string()));
    }

    let sections: Vec<ClassifiedSection> = blocks
        .into_iter()
        .map(|block| ClassifiedSection {
            label: classify_section(&block, rules),
            text: block.text,
        })
        .collect();
    info!("Classified {} blocks", sections.len());

    Ok(Json(ClassifyResponse { sections }))
}
