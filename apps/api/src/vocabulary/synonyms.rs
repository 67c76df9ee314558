//! Synonym table used by the second match tier.
//!
//! Each group is a canonical form plus the variants a resume may use instead.
//! Variants are matched as case-insensitive substrings, so a purely alphabetic
//! entry needs four letters or more to stay out of ordinary words ("eks" sits
//! inside "weeks").

use std::collections::HashMap;

const SYNONYM_GROUPS: &[(&str, &[&str])] = &[
    ("javascript", &["ecmascript", "es6", "vanilla js"]),
    ("typescript", &["type script"]),
    ("python", &["python3", "cpython"]),
    ("golang", &["go lang", "go programming"]),
    ("aws", &["amazon web services", "ec2", "cloudformation"]),
    ("gcp", &["google cloud", "bigquery"]),
    ("azure", &["microsoft azure", "azure devops"]),
    ("kubernetes", &["k8s", "amazon eks", "google kubernetes engine", "openshift"]),
    ("docker", &["containerization", "containerized", "dockerfile"]),
    ("postgresql", &["postgres", "psql"]),
    ("mongodb", &["mongo"]),
    ("sql", &["mysql", "t-sql", "pl/sql", "sqlite"]),
    ("react", &["react.js", "reactjs", "react native"]),
    ("node.js", &["nodejs", "node js"]),
    (
        "machine learning",
        &["deep learning", "neural network", "scikit-learn", "tensorflow", "pytorch"],
    ),
    (
        "ci/cd",
        &[
            "continuous integration",
            "continuous delivery",
            "continuous deployment",
            "jenkins",
            "github actions",
            "gitlab ci",
        ],
    ),
    ("rest api", &["restful", "rest apis", "rest services", "rest endpoints"]),
    ("agile", &["scrum", "kanban", "sprint planning"]),
    (
        "bachelor's degree",
        &["bachelor", "bachelors", "b.s.", "b.a.", "b.sc", "undergraduate degree"],
    ),
    (
        "master's degree",
        &["master of", "masters", "m.s.", "m.sc", "m.b.a.", "master of business administration"],
    ),
    ("phd", &["ph.d", "doctorate", "doctoral"]),
    ("project management", &["pmp certified", "program management", "managed projects"]),
    ("leadership", &["team lead", "mentored", "managed a team", "led a team"]),
    ("communication", &["communicated", "presentations", "presented to"]),
    ("problem solving", &["problem-solving", "troubleshooting", "debugging"]),
    ("data analysis", &["data analytics", "analyzed data", "data visualization"]),
];

/// Read-only canonical → variants lookup.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    groups: Vec<SynonymGroup>,
    /// Lower-cased canonical form or variant → index into `groups`.
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct SynonymGroup {
    pub canonical: String,
    pub variants: Vec<String>,
}

impl SynonymTable {
    pub fn builtin() -> Self {
        Self::from_groups(SYNONYM_GROUPS)
    }

    fn from_groups(groups: &[(&str, &[&str])]) -> Self {
        let mut table = SynonymTable {
            groups: Vec::with_capacity(groups.len()),
            index: HashMap::new(),
        };

        for (canonical, variants) in groups {
            let idx = table.groups.len();
            let group = SynonymGroup {
                canonical: normalize_term(canonical),
                variants: variants.iter().map(|v| normalize_term(v)).collect(),
            };
            table.index.entry(group.canonical.clone()).or_insert(idx);
            for variant in &group.variants {
                table.index.entry(variant.clone()).or_insert(idx);
            }
            table.groups.push(group);
        }

        table
    }

    /// Finds the group a keyword belongs to, whether it is the canonical form or a variant.
    pub fn group_for(&self, keyword: &str) -> Option<&SynonymGroup> {
        self.index
            .get(&normalize_term(keyword))
            .map(|&idx| &self.groups[idx])
    }
}

impl SynonymGroup {
    /// Canonical form followed by every variant.
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.variants.iter().map(String::as_str))
    }
}

/// Lower-cases, folds typographic apostrophes and collapses whitespace.
pub fn normalize_term(term: &str) -> String {
    term.replace(['\u{2019}', '\u{2018}'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_for_canonical_and_variant() {
        let table = SynonymTable::builtin();
        assert_eq!(table.group_for("Kubernetes").unwrap().canonical, "kubernetes");
        assert_eq!(table.group_for("k8s").unwrap().canonical, "kubernetes");
        assert!(table.group_for("cobol").is_none());
    }

    #[test]
    fn test_curly_apostrophe_resolves_to_same_group() {
        let table = SynonymTable::builtin();
        let group = table.group_for("Bachelor\u{2019}s   Degree").unwrap();
        assert_eq!(group.canonical, "bachelor's degree");
    }

    #[test]
    fn test_every_form_is_long_enough_for_substring_matching() {
        assert!(SYNONYM_GROUPS.len() > 20);
        for (_, variants) in SYNONYM_GROUPS {
            for variant in *variants {
                assert!(variant.len() >= 3, "variant '{variant}' too short");
                if variant.chars().all(|c| c.is_ascii_alphabetic()) {
                    assert!(variant.len() >= 4, "variant '{variant}' fits inside ordinary words");
                }
            }
        }
    }

    #[test]
    fn test_forms_lists_canonical_first() {
        let table = SynonymTable::builtin();
        let forms: Vec<&str> = table.group_for("mongo").unwrap().forms().collect();
        assert_eq!(forms, vec!["mongodb", "mongo"]);
    }
}
