//! Keyword and synonym-expansion relevance scoring.
//!
//! Table-driven: every rule contribution comes from a named weight in
//! [`ScoringWeights`], and the synonym expansions live in a fixed
//! bilingual table. Scoring is a pure function of its inputs, so
//! repeated calls with identical inputs yield identical rankings.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use docrag_core::{Chunk, ScoredChunk, ScoringWeights};

use crate::synonyms::{self, FINANCIAL_INTENT, FINANCIAL_VOCAB, GENERIC_FINANCIAL, SYNONYMS};

/// 4-digit years (1900-2099).
static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year regex"));

/// Monetary or percentage figures: currency-prefixed numbers, magnitude
/// words in English or Japanese, and percentages.
static FIGURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[$¥€£]\s?\d|\d[\d,]*(?:\.\d+)?\s*(?:billion|million|trillion|百万|億|兆)|\d+(?:\.\d+)?\s?%",
    )
    .expect("figure regex")
});

/// Pages cycle through this many diversity buckets for the tie-breaker.
const PAGE_CYCLE: u32 = 5;

/// Lexical relevance scorer with a loose-substring fallback cascade.
pub struct LexicalScorer {
    weights: ScoringWeights,
}

impl LexicalScorer {
    /// Create a scorer with the given weights.
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Create a scorer with the default weights.
    pub fn with_defaults() -> Self {
        Self::new(ScoringWeights::default())
    }

    /// Rank chunks against a query, best first.
    ///
    /// Cascade: strict table-driven scoring; if nothing qualifies or the
    /// best score is below the confidence floor, a looser substring
    /// scorer runs; if that also finds nothing, the first `limit` chunks
    /// are returned in original order. The result is empty only when
    /// `chunks` is empty or the query has no usable tokens.
    pub fn score(&self, query: &str, chunks: &[Chunk], limit: usize) -> Vec<ScoredChunk> {
        let query_lower = query.to_lowercase();
        let tokens = tokenize(&query_lower);

        if chunks.is_empty() || tokens.is_empty() {
            return Vec::new();
        }

        let strict = self.score_strict(&query_lower, &tokens, chunks, limit);
        let best = strict.first().map(|s| s.score).unwrap_or(0.0);
        if !strict.is_empty() && best >= self.weights.min_confidence {
            return strict;
        }

        debug!(
            best_score = best,
            "Strict lexical scoring below confidence floor, trying loose match"
        );

        let loose = self.score_loose(&query_lower, &tokens, chunks, limit);
        if !loose.is_empty() {
            return loose;
        }

        // Last resort: never return empty when chunks exist and the query
        // is non-trivial, so the synthesizer can still attempt an answer.
        debug!("Loose match found nothing, returning leading chunks");
        chunks
            .iter()
            .take(limit)
            .map(|chunk| ScoredChunk {
                chunk: chunk.clone(),
                score: 0.0,
            })
            .collect()
    }

    /// Table-driven scoring pass.
    fn score_strict(
        &self,
        query_lower: &str,
        tokens: &[String],
        chunks: &[Chunk],
        limit: usize,
    ) -> Vec<ScoredChunk> {
        let w = &self.weights;
        let expanded = expand_tokens(query_lower, tokens);
        let years: Vec<&str> = YEAR_RE
            .find_iter(query_lower)
            .map(|m| m.as_str())
            .collect();
        let has_intent = FINANCIAL_INTENT.iter().any(|t| query_lower.contains(t));

        let mut scored: Vec<ScoredChunk> = chunks
            .iter()
            .filter_map(|chunk| {
                let content = chunk.content.to_lowercase();
                let mut score = 0.0f32;

                // (a) exact query-token occurrences, weighted highest
                for token in tokens {
                    score += content.matches(token.as_str()).count() as f32 * w.exact_match;
                }

                // (b) synonym occurrences, weighted lower
                for synonym in &expanded {
                    score += content.matches(synonym.as_str()).count() as f32 * w.synonym_match;
                }

                // (c) substring bonus for longer tokens
                for token in tokens {
                    if token.chars().count() > 3 && content.contains(token.as_str()) {
                        score += w.substring;
                    }
                }

                // (d) financial-statement intent
                if has_intent && FINANCIAL_VOCAB.iter().any(|t| content.contains(t)) {
                    score += w.financial_intent;
                }

                // (e) year match
                for year in &years {
                    if content.contains(year) {
                        score += w.year_match;
                    }
                }

                // (f) monetary/percentage figure
                if FIGURE_RE.is_match(&content) {
                    score += w.figure;
                }

                if score <= 0.0 {
                    return None;
                }

                // (g) page-diversity tie-breaker, matching chunks only
                score += (chunk.page % PAGE_CYCLE) as f32 * w.page_diversity;

                Some(ScoredChunk {
                    chunk: chunk.clone(),
                    score,
                })
            })
            .collect();

        sort_descending(&mut scored);
        scored.truncate(limit);
        scored
    }

    /// Loose fallback: substring counting plus a flat financial bonus.
    fn score_loose(
        &self,
        _query_lower: &str,
        tokens: &[String],
        chunks: &[Chunk],
        limit: usize,
    ) -> Vec<ScoredChunk> {
        let w = &self.weights;
        let loose_tokens: Vec<&String> =
            tokens.iter().filter(|t| t.chars().count() > 2).collect();

        let mut scored: Vec<ScoredChunk> = chunks
            .iter()
            .filter_map(|chunk| {
                let content = chunk.content.to_lowercase();
                let mut score = 0.0f32;

                for token in &loose_tokens {
                    score += content.matches(token.as_str()).count() as f32 * w.loose_word;
                }

                if score > 0.0 && GENERIC_FINANCIAL.iter().any(|t| content.contains(t)) {
                    score += w.loose_financial;
                }

                if score > 0.0 {
                    Some(ScoredChunk {
                        chunk: chunk.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        sort_descending(&mut scored);
        scored.truncate(limit);
        scored
    }
}

/// Lowercased tokens split on whitespace and ASCII punctuation, with
/// single-character tokens dropped.
fn tokenize(query_lower: &str) -> Vec<String> {
    query_lower
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|t| t.chars().count() > 1)
        .map(|t| t.to_string())
        .collect()
}

/// Synonym expansion: union over the table, minus the original tokens.
///
/// ASCII table keys require an exact token match; Japanese keys match by
/// substring because Japanese queries carry no word boundaries.
fn expand_tokens(query_lower: &str, tokens: &[String]) -> BTreeSet<String> {
    let mut expanded = BTreeSet::new();

    for token in tokens {
        if let Some(exps) = synonyms::expansions(token) {
            for exp in exps {
                expanded.insert(exp.to_string());
            }
        }
    }

    for (key, exps) in SYNONYMS {
        if !key.is_ascii() && query_lower.contains(key) {
            for exp in *exps {
                expanded.insert(exp.to_string());
            }
        }
    }

    for token in tokens {
        expanded.remove(token.as_str());
    }

    expanded
}

/// Stable descending sort; ties keep original chunk order.
fn sort_descending(scored: &mut [ScoredChunk]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn chunk(page: u32, idx: u32, content: &str) -> Chunk {
        Chunk::new(
            Ulid::from(1u128),
            page,
            idx,
            content,
            "report.pdf",
            "https://x/report.pdf",
        )
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        let tokens = tokenize("what was the revenue in 2023?");
        assert!(tokens.contains(&"revenue".to_string()));
        assert!(tokens.contains(&"2023".to_string()));
        assert!(!tokens.iter().any(|t| t.chars().count() <= 1));
    }

    #[test]
    fn test_expansion_is_union_not_replacement() {
        let query = "revenue growth";
        let tokens = tokenize(query);
        let expanded = expand_tokens(query, &tokens);

        // Expansions present, originals excluded from the synonym set.
        assert!(expanded.contains("sales"));
        assert!(expanded.contains("increase"));
        assert!(!expanded.contains("revenue"));
        assert!(!expanded.contains("growth"));
    }

    #[test]
    fn test_japanese_key_expands_by_substring() {
        let query = "2023年の収益は？";
        let tokens = tokenize(query);
        let expanded = expand_tokens(query, &tokens);
        assert!(expanded.contains("revenue"));
    }

    #[test]
    fn test_end_to_end_revenue_example() {
        let scorer = LexicalScorer::with_defaults();
        let chunks = vec![chunk(
            1,
            0,
            "Revenue was $100 billion in 2023, up 10% year over year.",
        )];

        let ranked = scorer.score("What was the revenue in 2023?", &chunks, 5);
        assert_eq!(ranked.len(), 1);

        // Token "revenue", year "2023", and the currency figure all land.
        let w = ScoringWeights::default();
        assert!(ranked[0].score >= w.exact_match + w.year_match + w.figure);
    }

    #[test]
    fn test_deterministic_ordering() {
        let scorer = LexicalScorer::with_defaults();
        let chunks = vec![
            chunk(1, 0, "Revenue was $100 billion in 2023."),
            chunk(2, 0, "Total sales increased across all segments."),
            chunk(3, 0, "Employees numbered 164,000 at year end."),
        ];

        let first = scorer.score("revenue in 2023", &chunks, 5);
        for _ in 0..10 {
            let again = scorer.score("revenue in 2023", &chunks, 5);
            let ids_a: Vec<&str> = first.iter().map(|s| s.chunk.id.as_str()).collect();
            let ids_b: Vec<&str> = again.iter().map(|s| s.chunk.id.as_str()).collect();
            assert_eq!(ids_a, ids_b);
        }
    }

    #[test]
    fn test_exact_outranks_synonym_only() {
        let scorer = LexicalScorer::with_defaults();
        let chunks = vec![
            chunk(1, 0, "Sales grew modestly."),
            chunk(1, 1, "Revenue grew modestly."),
        ];

        let ranked = scorer.score("revenue", &chunks, 5);
        assert_eq!(ranked[0].chunk.chunk_index, 1);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_stable_tie_break_keeps_original_order() {
        let scorer = LexicalScorer::with_defaults();
        // Identical content on the same page: scores are equal, so the
        // stable sort must preserve input order.
        let chunks = vec![
            chunk(1, 0, "cash flow statement"),
            chunk(1, 1, "cash flow statement"),
        ];

        let ranked = scorer.score("cash", &chunks, 5);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.chunk_index, 0);
        assert_eq!(ranked[1].chunk.chunk_index, 1);
    }

    #[test]
    fn test_year_bonus_discriminates() {
        let scorer = LexicalScorer::with_defaults();
        let chunks = vec![
            chunk(1, 0, "Revenue was $90 billion in 2022."),
            chunk(1, 1, "Revenue was $100 billion in 2023."),
        ];

        let ranked = scorer.score("revenue in 2023", &chunks, 5);
        assert_eq!(ranked[0].chunk.chunk_index, 1);
    }

    #[test]
    fn test_loose_fallback_when_low_confidence() {
        let scorer = LexicalScorer::with_defaults();
        // "waymo" is in no synonym list and scores below the confidence
        // floor on exact matches alone; the loose pass still finds it.
        let chunks = vec![
            chunk(1, 0, "Other Bets includes Waymo and Verily."),
            chunk(2, 0, "Advertising remained the largest segment."),
        ];

        let ranked = scorer.score("waymo", &chunks, 5);
        assert!(!ranked.is_empty());
        assert_eq!(ranked[0].chunk.page, 1);
    }

    #[test]
    fn test_last_resort_returns_leading_chunks() {
        let scorer = LexicalScorer::with_defaults();
        let chunks = vec![
            chunk(1, 0, "alpha beta"),
            chunk(2, 0, "gamma delta"),
            chunk(3, 0, "epsilon zeta"),
        ];

        let ranked = scorer.score("zzzqqq", &chunks, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.page, 1);
        assert_eq!(ranked[1].chunk.page, 2);
    }

    #[test]
    fn test_trivial_query_returns_empty() {
        let scorer = LexicalScorer::with_defaults();
        let chunks = vec![chunk(1, 0, "some content")];
        assert!(scorer.score("a", &chunks, 5).is_empty());
        assert!(scorer.score("", &chunks, 5).is_empty());
    }

    #[test]
    fn test_figure_regex() {
        assert!(FIGURE_RE.is_match("$100 billion"));
        assert!(FIGURE_RE.is_match("up 10% year over year"));
        assert!(FIGURE_RE.is_match("¥2,500百万"));
        assert!(FIGURE_RE.is_match("350.0 billion"));
        assert!(!FIGURE_RE.is_match("no figures here"));
    }

    #[test]
    fn test_year_regex() {
        let years: Vec<&str> = YEAR_RE
            .find_iter("compare 2022 with 2023")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(years, vec!["2022", "2023"]);
        assert!(!YEAR_RE.is_match("12345"));
    }
}
