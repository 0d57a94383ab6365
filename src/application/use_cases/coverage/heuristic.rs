use super::{CoverageEntry, CoverageScorer};
use crate::domain::coverage::{CoverageDetail, CoverageReport, Importance, MissingArea};
use crate::domain::error::Result;
use crate::domain::generation_request::RequestInput;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

const MAX_SUGGESTIONS: usize = 5;

const DEFAULT_STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "along", "also", "among", "another", "because",
    "been", "before", "being", "below", "between", "both", "cannot", "could", "does", "doing",
    "down", "during", "each", "either", "every", "from", "further", "have", "having", "here",
    "into", "itself", "just", "less", "like", "many", "more", "most", "much", "must", "neither",
    "only", "other", "otherwise", "over", "same", "should", "shall", "since", "some", "such",
    "than", "that", "their", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "under", "until", "upon", "very", "were", "what", "when", "where",
    "whether", "which", "while", "will", "with", "within", "without", "would", "your",
];

static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?;\n]+").unwrap());
static OBLIGATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(should|must)\b").unwrap());

#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    /// Tokens must be strictly longer than this many characters.
    pub min_term_length: usize,
    pub stop_words: HashSet<String>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            min_term_length: 4,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|word| word.to_string()).collect(),
        }
    }
}

impl HeuristicConfig {
    pub fn with_extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() {
                self.stop_words.insert(word);
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Term {
    pub(crate) text: String,
    pub(crate) importance: Importance,
}

/// Single qualifying tokens first, then should/must clauses, each in order of
/// first appearance and without duplicates.
pub(crate) fn extract_terms(requirement: &str, config: &HeuristicConfig) -> Vec<Term> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();

    for token in requirement.split(|c: char| !c.is_alphanumeric()) {
        let token = token.to_lowercase();
        if token.chars().count() <= config.min_term_length || config.stop_words.contains(&token) {
            continue;
        }
        if seen.insert(token.clone()) {
            terms.push(Term {
                text: token,
                importance: Importance::Medium,
            });
        }
    }

    for clause in SENTENCE_BOUNDARY.split(requirement) {
        let clause = clause.trim();
        if clause.is_empty() || !OBLIGATION.is_match(clause) {
            continue;
        }
        let normalized = clause.to_lowercase();
        if seen.insert(normalized.clone()) {
            terms.push(Term {
                text: normalized,
                importance: Importance::High,
            });
        }
    }

    terms
}

pub struct HeuristicScorer {
    config: HeuristicConfig,
}

impl HeuristicScorer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn score_text(&self, entries: &[CoverageEntry], requirement: &str) -> CoverageReport {
        if requirement.trim().is_empty() {
            return CoverageReport::deferred();
        }

        let terms = extract_terms(requirement, &self.config);
        let haystacks: Vec<(&str, String)> = entries
            .iter()
            .map(|entry| (entry.id.as_str(), entry.text.to_lowercase()))
            .collect();

        let mut details = Vec::with_capacity(terms.len());
        let mut missing_areas = Vec::new();
        for term in &terms {
            let supporting: Vec<String> = haystacks
                .iter()
                .filter(|(_, text)| text.contains(&term.text))
                .map(|(id, _)| id.to_string())
                .collect();
            let covered = !supporting.is_empty();
            if !covered {
                missing_areas.push(MissingArea {
                    description: term.text.clone(),
                    importance: term.importance,
                });
            }
            details.push(CoverageDetail {
                area: term.text.clone(),
                covered,
                supporting_test_cases: supporting,
            });
        }

        let covered_count = details.iter().filter(|detail| detail.covered).count();
        let score = if terms.is_empty() {
            0
        } else {
            ((100.0 * covered_count as f64) / terms.len() as f64).round() as u8
        };
        debug!(
            terms = terms.len(),
            covered = covered_count,
            score,
            "Heuristic coverage scored"
        );

        let suggestions = missing_areas
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(|area| format!("Add a test case that exercises \"{}\"", area.description))
            .collect();
        let narrative = format!(
            "{} of {} requirement terms are covered by {} test case(s).",
            covered_count,
            terms.len(),
            entries.len()
        );

        CoverageReport {
            score: Some(score),
            missing_areas,
            coverage_details: details,
            suggestions,
            narrative: Some(narrative),
            requires_deep_analysis: false,
        }
    }
}

#[async_trait]
impl CoverageScorer for HeuristicScorer {
    async fn score(
        &self,
        entries: &[CoverageEntry],
        requirement: &RequestInput,
    ) -> Result<CoverageReport> {
        match requirement {
            RequestInput::Text { criteria } => Ok(self.score_text(entries, criteria)),
            _ => Ok(CoverageReport::deferred()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, text: &str) -> CoverageEntry {
        CoverageEntry {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    fn scorer() -> HeuristicScorer {
        HeuristicScorer::new(HeuristicConfig::default())
    }

    #[test]
    fn test_terms_skip_short_and_stop_words() {
        let terms = extract_terms(
            "The user with admin rights deletes other accounts",
            &HeuristicConfig::default(),
        );
        let texts: Vec<&str> = terms.iter().map(|term| term.text.as_str()).collect();
        assert_eq!(texts, vec!["admin", "rights", "deletes", "accounts"]);
    }

    #[test]
    fn test_obligation_clauses_are_high_importance_terms() {
        let terms = extract_terms(
            "Login page. The account must lock after five failures! Show a banner",
            &HeuristicConfig::default(),
        );
        let clause = terms
            .iter()
            .find(|term| term.importance == Importance::High)
            .unwrap();
        assert_eq!(clause.text, "the account must lock after five failures");
        assert_eq!(terms.iter().filter(|t| t.importance == Importance::High).count(), 1);
    }

    #[test]
    fn test_three_of_four_terms_covered_scores_75() {
        let report = scorer().score_text(
            &[
                entry("TC-001", "Open the checkout page and apply a coupon"),
                entry("TC-002", "Verify the invoice total"),
            ],
            "checkout coupon invoice refund",
        );
        assert_eq!(report.score, Some(75));
        assert_eq!(report.missing_areas.len(), 1);
        assert_eq!(report.missing_areas[0].description, "refund");
        assert_eq!(report.missing_areas[0].importance, Importance::Medium);
        assert_eq!(report.coverage_details.len(), 4);
        assert_eq!(report.coverage_details[0].supporting_test_cases, vec!["TC-001"]);
        assert_eq!(report.suggestions.len(), 1);
        assert!(!report.requires_deep_analysis);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let report = scorer().score_text(&[entry("TC-001", "CHECKOUT works")], "Checkout");
        assert_eq!(report.score, Some(100));
    }

    #[test]
    fn test_whitespace_requirement_is_deferred() {
        let report = scorer().score_text(&[entry("TC-001", "anything")], " \n\t ");
        assert_eq!(report, CoverageReport::deferred());
    }

    #[test]
    fn test_no_qualifying_terms_scores_zero() {
        let report = scorer().score_text(&[entry("TC-001", "anything")], "a b to it");
        assert_eq!(report.score, Some(0));
        assert!(report.missing_areas.is_empty());
        assert!(!report.requires_deep_analysis);
    }

    #[test]
    fn test_suggestions_are_capped() {
        let report = scorer().score_text(
            &[],
            "alpha1 bravo2 charlie delta echo1 foxtrot golf1 hotel",
        );
        assert_eq!(report.score, Some(0));
        assert_eq!(report.suggestions.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_extra_stop_words_are_respected() {
        let config = HeuristicConfig::default().with_extra_stop_words(["Checkout"]);
        let terms = extract_terms("checkout coupon", &config);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].text, "coupon");
    }
}
