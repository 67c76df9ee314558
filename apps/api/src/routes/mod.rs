pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::matching::handlers as matching;
use crate::scoring::handlers as scoring;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/match", post(matching::handle_match))
        .route("/api/v1/score", post(scoring::handle_score))
        .route(
            "/api/v1/sections/classify",
            post(matching::handle_classify_sections),
        )
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::testing::{quota, unavailable, StubService};
    use crate::llm_client::{LlmClient, ReasoningService};
    use crate::vocabulary::Vocabulary;

    const SCENARIO_JD: &str =
        "5+ years of Python and AWS experience required. Bachelor's degree preferred.";
    const SCENARIO_RESUME: &str = "Senior Engineer with 6 years experience in Python, AWS, and SQL. \
         Bachelor of Science in Computer Science.";

    fn app(service: impl ReasoningService + 'static) -> Router {
        build_router(AppState {
            llm: Arc::new(service),
            vocab: Arc::new(Vocabulary::load().unwrap()),
            config: Config::default(),
        })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn category<'a>(report: &'a Value, name: &str) -> &'a Value {
        report["categoryScores"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == name)
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(StubService::failing(unavailable))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app(StubService::failing(unavailable))
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_score_rejects_empty_resume() {
        let (status, body) = post_json(
            app(StubService::failing(unavailable)),
            "/api/v1/score",
            json!({"jobDescription": SCENARIO_JD, "resumeContent": "   "}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_match_rejects_missing_job_description() {
        let (status, _) = post_json(
            app(StubService::failing(unavailable)),
            "/api/v1/match",
            json!({"resumeContent": SCENARIO_RESUME}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_match_scenario() {
        let (status, body) = post_json(
            app(StubService::failing(unavailable)),
            "/api/v1/match",
            json!({"jobDescription": SCENARIO_JD, "resumeContent": SCENARIO_RESUME}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 75);
        let python = &body["keywords"][1];
        assert_eq!(python["keyword"], "python");
        assert_eq!(python["matchType"], "direct");
        assert_eq!(python["confidence"], 1.0);
        assert_eq!(body["keywords"][3]["matchType"], "synonym");
    }

    #[tokio::test]
    async fn test_score_scenario_under_quota() {
        let (status, body) = post_json(
            app(StubService::failing(quota)),
            "/api/v1/score",
            json!({"jobDescription": SCENARIO_JD, "resumeContent": SCENARIO_RESUME}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categoryScores"].as_array().unwrap().len(), 10);
        assert_eq!(category(&body, "Experience Level")["score"], 10);
        assert_eq!(category(&body, "Experience Level")["max"], 10);
        let total = body["totalScore"].as_u64().unwrap();
        assert!(total <= 100);
    }

    #[tokio::test]
    async fn test_score_accepts_previous_match_output() {
        let keyword_match = json!({
            "keywords": [
                {"keyword": "python", "found": true, "matchType": "direct", "confidence": 1.0, "explanation": ""},
                {"keyword": "go", "found": false, "matchType": "none", "confidence": 0.0, "explanation": ""}
            ],
            "score": 50
        });
        let (status, body) = post_json(
            app(StubService::failing(quota)),
            "/api/v1/score",
            json!({
                "jobDescription": SCENARIO_JD,
                "resumeContent": SCENARIO_RESUME,
                "keywordMatch": keyword_match
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(category(&body, "Keyword Match")["score"], 10);
    }

    #[tokio::test]
    async fn test_score_accepts_keyword_match_without_score() {
        let keyword_match = json!({
            "keywords": [
                {"keyword": "python", "found": true, "matchType": "direct", "confidence": 1.0, "explanation": ""}
            ]
        });
        let (status, body) = post_json(
            app(StubService::failing(quota)),
            "/api/v1/score",
            json!({
                "jobDescription": SCENARIO_JD,
                "resumeContent": SCENARIO_RESUME,
                "keywordMatch": keyword_match
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(category(&body, "Keyword Match")["score"], 20);
    }

    #[tokio::test]
    async fn test_score_without_api_key_uses_all_categories() {
        let (status, body) = post_json(
            app(LlmClient::new(None, Duration::from_secs(1))),
            "/api/v1/score",
            json!({"jobDescription": SCENARIO_JD, "resumeContent": SCENARIO_RESUME}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categoryScores"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_classify_blocks() {
        let (status, body) = post_json(
            app(StubService::failing(unavailable)),
            "/api/v1/sections/classify",
            json!({"blocks": [
                {"text": "EXPERIENCE", "bold": true, "allCaps": true},
                {"text": "2021"}
            ]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sections"][0]["label"], "EXPERIENCE");
        assert_eq!(body["sections"][1]["label"], "IGNORE");
    }

    #[tokio::test]
    async fn test_classify_document() {
        let (status, body) = post_json(
            app(StubService::failing(unavailable)),
            "/api/v1/sections/classify",
            json!({"document": "<h2>Education</h2><p>State University</p>"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sections"][0]["text"], "Education");
        assert_eq!(body["sections"][0]["label"], "EDUCATION");
    }

    #[tokio::test]
    async fn test_classify_rejects_empty_blocks() {
        let (status, _) = post_json(
            app(StubService::failing(unavailable)),
            "/api/v1/sections/classify",
            json!({"blocks": []}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
