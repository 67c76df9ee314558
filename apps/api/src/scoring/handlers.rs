//! Axum route handler for resume scoring.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::{require_text, MatchOptions, MatchReport};
use crate::scoring::aggregate::ScoreReport;
use crate::scoring::score_resume;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub resume_content: String,
    /// Output of a previous match call; skips extraction when present.
    #[serde(default)]
    pub keyword_match: Option<MatchReport>,
}

/// POST /api/v1/score
///
/// Scores the resume across the ten categories and aggregates to 0–100.
/// Always answers 200 for valid input, whatever tier the ladder ended on.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreReport>, AppError> {
    require_text("jobDescription", &request.job_description)?;
    require_text("resumeContent", &request.resume_content)?;

    let span = info_span!("score", request_id = %Uuid::new_v4());
    let report = score_resume(
        &request.job_description,
        &request.resume_content,
        request.keyword_match.map(|m| m.keywords),
        state.llm.as_ref(),
        &state.vocab,
        MatchOptions::from(&state.config),
    )
    .instrument(span)
    .await;

    Ok(Json(report))
}
