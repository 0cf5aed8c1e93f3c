//! Automatic reference-based metrics: sentence BLEU and token overlap.
//!
//! BLEU follows the usual sentence-level definition with clipped n-gram
//! precision, a brevity penalty and additive smoothing for orders with no
//! matches (a zero numerator becomes `0.1 / denominator`). BLEU-n averages
//! the log precisions of orders `1..=n` with uniform weights. Orders longer
//! than both texts are skipped, so identical short texts still score 100.
//!
//! All reported values are percentages rounded to two decimals.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:'\w+)?|[^\w\s]").expect("valid token regex"));

/// Numerator used for orders without any matching n-gram.
const SMOOTHING_EPSILON: f64 = 0.1;

/// BLEU-1 through BLEU-4.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BleuScores {
    pub bleu_1: f64,
    pub bleu_2: f64,
    pub bleu_3: f64,
    pub bleu_4: f64,
}

/// Set-based token overlap between candidate and reference.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlapScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub overlap_tokens: usize,
}

/// Automatic metrics for one candidate document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricReport {
    pub bleu: BleuScores,
    pub overlap: OverlapScores,
}

/// Scores candidate documents against a reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoMetricScorer;

impl AutoMetricScorer {
    pub fn score(&self, reference: &str, candidate: &str) -> MetricReport {
        let reference = tokenize(reference);
        let candidate = tokenize(candidate);
        MetricReport {
            bleu: bleu_scores(&reference, &candidate),
            overlap: token_overlap(&reference, &candidate),
        }
    }
}

/// Lowercased word and punctuation tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// BLEU-1..4 as percentages.
pub fn bleu_scores(reference: &[String], candidate: &[String]) -> BleuScores {
    BleuScores {
        bleu_1: percent(sentence_bleu(reference, candidate, 1)),
        bleu_2: percent(sentence_bleu(reference, candidate, 2)),
        bleu_3: percent(sentence_bleu(reference, candidate, 3)),
        bleu_4: percent(sentence_bleu(reference, candidate, 4)),
    }
}

/// Sentence BLEU with uniform weights over orders `1..=max_n`, in `[0, 1]`.
pub fn sentence_bleu(reference: &[String], candidate: &[String], max_n: usize) -> f64 {
    if max_n == 0 || candidate.is_empty() {
        return 0.0;
    }

    // An order neither text is long enough to form carries no evidence and
    // counts as an exact match.
    let precisions: Vec<Option<(usize, usize)>> = (1..=max_n)
        .map(|n| {
            if candidate.len() < n && reference.len() < n {
                None
            } else {
                Some(modified_precision(reference, candidate, n))
            }
        })
        .collect();

    if matches!(precisions[0], Some((0, _))) {
        return 0.0;
    }

    let weight = 1.0 / max_n as f64;
    let log_sum: f64 = precisions
        .iter()
        .map(|precision| {
            let p = match *precision {
                None => 1.0,
                Some((0, denominator)) => SMOOTHING_EPSILON / denominator as f64,
                Some((numerator, denominator)) => numerator as f64 / denominator as f64,
            };
            weight * p.ln()
        })
        .sum();

    brevity_penalty(reference.len(), candidate.len()) * log_sum.exp()
}

/// Clipped n-gram matches and the candidate n-gram count (at least 1).
fn modified_precision(reference: &[String], candidate: &[String], n: usize) -> (usize, usize) {
    let candidate_counts = ngram_counts(candidate, n);
    let reference_counts = ngram_counts(reference, n);

    let numerator = candidate_counts
        .iter()
        .map(|(gram, &count)| count.min(reference_counts.get(gram).copied().unwrap_or(0)))
        .sum();
    let denominator = candidate_counts.values().sum::<usize>().max(1);

    (numerator, denominator)
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

fn brevity_penalty(reference_len: usize, candidate_len: usize) -> f64 {
    if candidate_len > reference_len {
        1.0
    } else if candidate_len == 0 {
        0.0
    } else {
        (1.0 - reference_len as f64 / candidate_len as f64).exp()
    }
}

/// Set-based precision, recall and F1 as percentages.
pub fn token_overlap(reference: &[String], candidate: &[String]) -> OverlapScores {
    let reference: HashSet<&str> = reference.iter().map(String::as_str).collect();
    let candidate: HashSet<&str> = candidate.iter().map(String::as_str).collect();
    let shared = reference.intersection(&candidate).count();

    let precision = if candidate.is_empty() {
        0.0
    } else {
        shared as f64 / candidate.len() as f64
    };
    let recall = if reference.is_empty() {
        0.0
    } else {
        shared as f64 / reference.len() as f64
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    OverlapScores {
        precision: percent(precision),
        recall: percent(recall),
        f1: percent(f1),
        overlap_tokens: shared,
    }
}

fn percent(value: f64) -> f64 {
    (value * 10000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "The MessageBus class routes events from publishers to every registered subscriber.";

    fn score(reference: &str, candidate: &str) -> MetricReport {
        AutoMetricScorer.score(reference, candidate)
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Don't call Bus::publish(), OK?"),
            vec!["don't", "call", "bus", ":", ":", "publish", "(", ")", ",", "ok", "?"]
        );
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_identical_texts_score_100() {
        let report = score(REFERENCE, REFERENCE);
        assert_eq!(report.bleu.bleu_1, 100.0);
        assert_eq!(report.bleu.bleu_2, 100.0);
        assert_eq!(report.bleu.bleu_3, 100.0);
        assert_eq!(report.bleu.bleu_4, 100.0);
        assert_eq!(report.overlap.f1, 100.0);
    }

    #[test]
    fn test_identical_short_texts_score_100() {
        for text in ["publish", "bus publish", "Bus::publish"] {
            let report = score(text, text);
            assert_eq!(report.bleu.bleu_1, 100.0, "{text}");
            assert_eq!(report.bleu.bleu_2, 100.0, "{text}");
            assert_eq!(report.bleu.bleu_3, 100.0, "{text}");
            assert_eq!(report.bleu.bleu_4, 100.0, "{text}");
        }
    }

    #[test]
    fn test_short_candidate_against_longer_reference_is_penalised() {
        // The reference has bigrams the candidate cannot form.
        let report = score("publish events", "publish");
        assert!(report.bleu.bleu_1 < 100.0);
        assert!(report.bleu.bleu_2 < report.bleu.bleu_1);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        let report = score(REFERENCE, "completely unrelated words here");
        assert_eq!(report.bleu.bleu_1, 0.0);
        assert_eq!(report.bleu.bleu_4, 0.0);
        assert_eq!(report.overlap.f1, 0.0);
        assert_eq!(report.overlap.overlap_tokens, 0);
    }

    #[test]
    fn test_empty_inputs() {
        let report = score(REFERENCE, "");
        assert_eq!(report.bleu, BleuScores::default());
        assert_eq!(report.overlap.precision, 0.0);

        let report = score("", "");
        assert_eq!(report.bleu.bleu_4, 0.0);
        assert_eq!(report.overlap.f1, 0.0);
    }

    #[test]
    fn test_scores_in_range_and_non_increasing() {
        // Same words, shuffled: unigrams match but few longer n-grams do.
        let candidate = "subscriber every to publishers from events routes class messagebus the.";
        let report = score(REFERENCE, candidate);
        let b = report.bleu;
        for v in [b.bleu_1, b.bleu_2, b.bleu_3, b.bleu_4] {
            assert!((0.0..=100.0).contains(&v));
        }
        assert!(b.bleu_1 > 0.0);
        assert!(b.bleu_1 >= b.bleu_2);
        assert!(b.bleu_2 >= b.bleu_3);
        assert!(b.bleu_3 >= b.bleu_4);
        assert_eq!(report.overlap.precision, 100.0);
    }

    #[test]
    fn test_brevity_penalty() {
        assert_eq!(brevity_penalty(10, 12), 1.0);
        assert_eq!(brevity_penalty(10, 0), 0.0);
        assert!((brevity_penalty(10, 5) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_for_missing_orders() {
        let reference = tokenize("a b c d");
        let candidate = tokenize("a b x y");
        // p1 = 2/4, p2 = 1/3, p3 = 0.1/2, p4 = 0.1/1, equal lengths.
        let expected = ((0.5f64.ln() + (1.0f64 / 3.0).ln() + 0.05f64.ln() + 0.1f64.ln()) / 4.0).exp();
        assert!((sentence_bleu(&reference, &candidate, 4) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_clipped_counts() {
        let reference = tokenize("the bus");
        let candidate = tokenize("the the the");
        assert_eq!(modified_precision(&reference, &candidate, 1), (1, 3));
    }

    #[test]
    fn test_overlap_partial() {
        let report = score("alpha beta gamma delta", "alpha beta epsilon");
        assert_eq!(report.overlap.overlap_tokens, 2);
        assert_eq!(report.overlap.precision, 66.67);
        assert_eq!(report.overlap.recall, 50.0);
        assert_eq!(report.overlap.f1, 57.14);
    }
}
