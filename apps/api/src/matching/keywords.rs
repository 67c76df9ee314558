//! Keyword Extractor: turns a job description into at most 15 weighted keywords.
//!
//! Primary path asks the reasoning service for keyword/importance/context triples.
//! Any service or parse failure falls back to the pattern library plus a
//! capitalized-token heuristic, ranked by frequency. Extraction never fails;
//! an empty list is a valid result.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{call_json, LlmError, ReasoningService};
use crate::matching::prompts::KEYWORD_EXTRACTION_PROMPT_TEMPLATE;
use crate::vocabulary::patterns::CAPITALIZED_STOPLIST;
use crate::vocabulary::synonyms::normalize_term;
use crate::vocabulary::Vocabulary;

pub const MAX_KEYWORDS: usize = 15;
const FALLBACK_CONTEXT: &str = "Detected in job description";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[default]
    Required,
    Preferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordSource {
    Service,
    Fallback,
}

/// One keyword extracted from a job description. Request-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub importance: Importance,
    pub context: String,
    pub source: KeywordSource,
}

#[derive(Debug, Deserialize)]
struct ExtractionReply {
    keywords: Vec<ServiceKeyword>,
}

#[derive(Debug, Deserialize)]
struct ServiceKeyword {
    keyword: String,
    #[serde(default)]
    importance: Importance,
    #[serde(default)]
    context: String,
}

/// Extracts keywords, preferring the reasoning service and falling back to patterns.
pub async fn extract_keywords(
    jd_text: &str,
    service: &dyn ReasoningService,
    vocab: &Vocabulary,
) -> Vec<Keyword> {
    if !service.is_available() {
        debug!("Reasoning service not configured, extracting with patterns");
        return extract_with_patterns(jd_text, vocab);
    }
    match extract_with_service(jd_text, service).await {
        Ok(keywords) => {
            debug!("Service extracted {} keywords", keywords.len());
            keywords
        }
        Err(e) => {
            warn!(kind = %e.kind(), "Keyword extraction via service failed, using pattern fallback: {e}");
            extract_with_patterns(jd_text, vocab)
        }
    }
}

async fn extract_with_service(
    jd_text: &str,
    service: &dyn ReasoningService,
) -> Result<Vec<Keyword>, LlmError> {
    let prompt = KEYWORD_EXTRACTION_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
    let reply: ExtractionReply = call_json(service, &prompt, JSON_ONLY_SYSTEM).await?;

    let mut seen = HashSet::new();
    let keywords = reply
        .keywords
        .into_iter()
        .filter_map(|k| {
            let text = normalize_term(&k.keyword);
            if text.is_empty() || !seen.insert(text.clone()) {
                return None;
            }
            Some(Keyword {
                text,
                importance: k.importance,
                context: k.context.trim().to_string(),
                source: KeywordSource::Service,
            })
        })
        .take(MAX_KEYWORDS)
        .collect();

    Ok(keywords)
}

#[derive(Debug)]
struct Tally {
    count: usize,
    first_seen: usize,
}

/// Deterministic extraction: pattern library hits plus capitalized tokens that no
/// pattern already covered, ranked by frequency then first occurrence.
pub fn extract_with_patterns(jd_text: &str, vocab: &Vocabulary) -> Vec<Keyword> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    let mut covered: Vec<(usize, usize)> = Vec::new();

    let mut record = |term: String, position: usize| {
        tallies
            .entry(term)
            .and_modify(|t| t.count += 1)
            .or_insert(Tally {
                count: 1,
                first_seen: position,
            });
    };

    for pattern in &vocab.keyword_patterns {
        for m in pattern.regex.find_iter(jd_text) {
            debug!(category = ?pattern.category, term = m.as_str(), "Pattern hit");
            covered.push((m.start(), m.end()));
            record(normalize_term(m.as_str()), m.start());
        }
    }

    for m in vocab.capitalized_token.find_iter(jd_text) {
        let overlaps_pattern = covered
            .iter()
            .any(|&(start, end)| m.start() < end && start < m.end());
        if overlaps_pattern || m.as_str().len() < 2 || is_sentence_initial(jd_text, m.start()) {
            continue;
        }
        let term = normalize_term(m.as_str());
        if CAPITALIZED_STOPLIST.contains(&term.as_str()) {
            continue;
        }
        record(term, m.start());
    }

    let mut ranked: Vec<(String, Tally)> = tallies.into_iter().collect();
    ranked.sort_by_key(|(_, t)| (Reverse(t.count), t.first_seen));

    ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(text, _)| Keyword {
            text,
            importance: Importance::Required,
            context: FALLBACK_CONTEXT.to_string(),
            source: KeywordSource::Fallback,
        })
        .collect()
}

/// True at the start of the text or right after sentence-ending punctuation.
fn is_sentence_initial(text: &str, start: usize) -> bool {
    match text[..start].trim_end().chars().next_back() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{quota, unavailable, StubService};
    use crate::llm_client::LlmClient;
    use std::time::Duration;

    const SCENARIO_JD: &str =
        "5+ years of Python and AWS experience required. Bachelor's degree preferred.";

    fn texts(keywords: &[Keyword]) -> Vec<&str> {
        keywords.iter().map(|k| k.text.as_str()).collect()
    }

    #[test]
    fn test_fallback_on_scenario_jd() {
        let vocab = Vocabulary::load().unwrap();
        let keywords = extract_with_patterns(SCENARIO_JD, &vocab);
        assert_eq!(
            texts(&keywords),
            vec!["5+ years", "python", "aws", "bachelor's degree"]
        );
        assert!(keywords
            .iter()
            .all(|k| k.importance == Importance::Required && k.source == KeywordSource::Fallback));
        assert!(keywords.iter().all(|k| !k.context.is_empty()));
    }

    #[test]
    fn test_fallback_ranks_by_frequency() {
        let vocab = Vocabulary::load().unwrap();
        let jd = "We use Docker daily. Kubernetes runs our Docker images. Docker everywhere.";
        let keywords = extract_with_patterns(jd, &vocab);
        assert_eq!(keywords[0].text, "docker");
        assert_eq!(keywords[1].text, "kubernetes");
    }

    #[test]
    fn test_fallback_picks_up_unknown_capitalized_technology() {
        let vocab = Vocabulary::load().unwrap();
        let jd = "You will build pipelines with Snowpark and Dagster on our platform.";
        let keywords = extract_with_patterns(jd, &vocab);
        let found = texts(&keywords);
        assert!(found.contains(&"snowpark"));
        assert!(found.contains(&"dagster"));
        assert!(!found.contains(&"you"));
    }

    #[test]
    fn test_fallback_caps_at_fifteen() {
        let vocab = Vocabulary::load().unwrap();
        let jd = "Need Python, Java, Ruby, PHP, Swift, Kotlin, Scala, Perl, SQL, Rust, \
                  Docker, Kubernetes, Terraform, Jenkins, Jira, Kafka, Linux, GraphQL.";
        assert_eq!(extract_with_patterns(jd, &vocab).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_fallback_on_plain_prose_may_be_empty() {
        let vocab = Vocabulary::load().unwrap();
        assert!(extract_with_patterns("we are hiring someone nice", &vocab).is_empty());
    }

    #[test]
    fn test_sentence_initial_detection() {
        let text = "Python rocks. Rust too";
        assert!(is_sentence_initial(text, 0));
        assert!(is_sentence_initial(text, 14));
        assert!(!is_sentence_initial(text, 19));
    }

    #[tokio::test]
    async fn test_service_path_normalizes_and_dedupes() {
        let vocab = Vocabulary::load().unwrap();
        let stub = StubService::replying(
            r#"{"keywords": [
                {"keyword": "Python", "importance": "required", "context": "5+ years of Python"},
                {"keyword": " python ", "importance": "preferred", "context": "dup"},
                {"keyword": "AWS", "importance": "preferred", "context": "AWS experience"},
                {"keyword": "", "importance": "required", "context": "blank"}
            ]}"#,
        );

        let keywords = extract_keywords(SCENARIO_JD, &stub, &vocab).await;
        assert_eq!(texts(&keywords), vec!["python", "aws"]);
        assert_eq!(keywords[1].importance, Importance::Preferred);
        assert!(keywords.iter().all(|k| k.source == KeywordSource::Service));
        assert!(stub.prompts()[0].contains(SCENARIO_JD));
    }

    #[tokio::test]
    async fn test_service_path_truncates_to_fifteen() {
        let vocab = Vocabulary::load().unwrap();
        let entries: Vec<String> = (0..20)
            .map(|i| format!(r#"{{"keyword": "skill{i}", "importance": "required", "context": ""}}"#))
            .collect();
        let stub = StubService::replying(format!(r#"{{"keywords": [{}]}}"#, entries.join(",")));

        let keywords = extract_keywords("anything", &stub, &vocab).await;
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0].text, "skill0");
    }

    #[tokio::test]
    async fn test_service_reply_wrapped_in_prose_is_recovered() {
        let vocab = Vocabulary::load().unwrap();
        let stub = StubService::replying(
            "Here you go: {\"keywords\": [{\"keyword\": \"Terraform\", \"importance\": \"required\", \"context\": \"IaC\"}]} Thanks!",
        );
        let keywords = extract_keywords("anything", &stub, &vocab).await;
        assert_eq!(texts(&keywords), vec!["terraform"]);
        assert_eq!(keywords[0].source, KeywordSource::Service);
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let vocab = Vocabulary::load().unwrap();
        let stub = StubService::replying("{\"keywords\": [{\"keyword\": 42}]}");
        let keywords = extract_keywords(SCENARIO_JD, &stub, &vocab).await;
        assert!(keywords.iter().all(|k| k.source == KeywordSource::Fallback));
        assert_eq!(keywords.len(), 4);
    }

    #[tokio::test]
    async fn test_unconfigured_client_uses_patterns() {
        let vocab = Vocabulary::load().unwrap();
        let client = LlmClient::new(None, Duration::from_secs(1));
        let keywords = extract_keywords(SCENARIO_JD, &client, &vocab).await;
        assert_eq!(
            texts(&keywords),
            vec!["5+ years", "python", "aws", "bachelor's degree"]
        );
    }

    #[tokio::test]
    async fn test_service_errors_fall_back() {
        let vocab = Vocabulary::load().unwrap();
        for stub in [StubService::failing(quota), StubService::failing(unavailable)] {
            let keywords = extract_keywords(SCENARIO_JD, &stub, &vocab).await;
            assert_eq!(keywords.len(), 4);
            assert_eq!(stub.calls(), 1);
        }
    }
}
