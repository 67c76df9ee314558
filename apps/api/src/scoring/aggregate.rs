use serde::{Deserialize, Serialize};

use crate::scoring::categories::CategoryScore;

/// Final report returned by the score endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub total_score: u32,
    pub category_scores: Vec<CategoryScore>,
}

impl ScoreReport {
    pub fn from_categories(category_scores: Vec<CategoryScore>) -> Self {
        Self {
            total_score: total_score(&category_scores),
            category_scores,
        }
    }
}

/// round(100 · Σscore / Σmax) over the categories actually present; 0 when empty.
pub fn total_score(categories: &[CategoryScore]) -> u32 {
    let max: u32 = categories.iter().map(|c| c.max).sum();
    if max == 0 {
        return 0;
    }
    let score: u32 = categories.iter().map(|c| c.score.min(c.max)).sum();
    (100.0 * score as f64 / max as f64).round() as u32
}
