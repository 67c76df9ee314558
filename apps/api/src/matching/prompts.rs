// Prompt constants for keyword extraction and semantic matching.
// Reuses the JSON-only system prompt from llm_client::prompts.

/// Keyword extraction prompt template. Replace `{jd_text}` before sending.
pub const KEYWORD_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract the keywords an applicant tracking system would screen for in the job description below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "keywords": [
    {"keyword": "Python", "importance": "required", "context": "5+ years of Python experience required"}
  ]
}

Rules:
- At most 15 keywords, most important first.
- "importance" is exactly "required" or "preferred".
- "context" is the short phrase from the job description the keyword came from.
- Prefer concrete skills, tools, credentials and experience requirements over generic words.

JOB DESCRIPTION:
{jd_text}"#;

/// Semantic match prompt template. Replace `{keyword}` and `{resume_text}` before sending.
pub const SEMANTIC_MATCH_PROMPT_TEMPLATE: &str = r#"Decide whether the resume below demonstrates the skill or requirement "{keyword}", even if it uses different wording.

Return a JSON object with this EXACT schema (no extra fields):
{"matched": true, "confidence": 0.75, "explanation": "Mentions building ETL pipelines in Spark"}

Rules:
- "confidence" is a number between 0 and 1.
- Only answer true when the resume shows concrete evidence.

RESUME:
{resume_text}"#;
