//! Winner selection between baseline and augmented documentation.

use super::metrics::MetricReport;
use super::parser::ScoreCard;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "no-rag")]
    NoRag,
    #[serde(rename = "rag")]
    Rag,
    #[serde(rename = "tie")]
    Tie,
}

impl Winner {
    /// Display label used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Winner::NoRag => "No-RAG",
            Winner::Rag => "RAG",
            Winner::Tie => "TIE",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Anything with a single number that decides a comparison.
pub trait Scored {
    fn decisive_score(&self) -> f64;
}

impl Scored for ScoreCard {
    fn decisive_score(&self) -> f64 {
        f64::from(self.total)
    }
}

impl Scored for MetricReport {
    fn decisive_score(&self) -> f64 {
        self.bleu.bleu_4
    }
}

/// A missing side scores 0.
impl<T: Scored> Scored for Option<T> {
    fn decisive_score(&self) -> f64 {
        self.as_ref().map_or(0.0, Scored::decisive_score)
    }
}

/// Both scorecards and the declared winner.
///
/// Serializes with the `no_rag` / `rag` / `winner` keys used in result files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict<T> {
    #[serde(rename = "no_rag")]
    pub baseline: T,
    #[serde(rename = "rag")]
    pub augmented: T,
    pub winner: Winner,
    /// Set when equal scores forced a tie.
    pub tie_break_rule_applied: bool,
}

/// Strictly higher decisive score wins; equal scores tie.
pub fn compare<T: Scored>(baseline: T, augmented: T) -> Verdict<T> {
    let b = baseline.decisive_score();
    let a = augmented.decisive_score();
    let winner = if a > b {
        Winner::Rag
    } else if b > a {
        Winner::NoRag
    } else {
        Winner::Tie
    };

    Verdict {
        baseline,
        augmented,
        winner,
        tie_break_rule_applied: winner == Winner::Tie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::parser::JudgeScoreParser;

    fn card(total_each: u32) -> ScoreCard {
        let raw = format!(
            r#"{{"completeness": {v}, "accuracy": {v}, "clarity": {v}, "structure": {v}, "context_enrichment": {v}}}"#,
            v = total_each
        );
        JudgeScoreParser::new().parse(&raw)
    }

    #[test]
    fn test_higher_total_wins() {
        let verdict = compare(card(7), card(8));
        assert_eq!(verdict.baseline.total, 35);
        assert_eq!(verdict.augmented.total, 40);
        assert_eq!(verdict.winner, Winner::Rag);
        assert!(!verdict.tie_break_rule_applied);

        assert_eq!(compare(card(8), card(7)).winner, Winner::NoRag);
    }

    #[test]
    fn test_equal_totals_tie() {
        let verdict = compare(card(6), card(6));
        assert_eq!(verdict.winner, Winner::Tie);
        assert!(verdict.tie_break_rule_applied);
    }

    #[test]
    fn test_metric_reports_use_bleu_4() {
        let mut baseline = MetricReport::default();
        let mut augmented = MetricReport::default();
        baseline.bleu.bleu_1 = 90.0;
        baseline.bleu.bleu_4 = 10.0;
        augmented.bleu.bleu_1 = 50.0;
        augmented.bleu.bleu_4 = 12.5;
        assert_eq!(compare(baseline, augmented).winner, Winner::Rag);
    }

    #[test]
    fn test_missing_side_scores_zero() {
        let mut present = MetricReport::default();
        present.bleu.bleu_4 = 1.0;
        assert_eq!(compare(None, Some(present)).winner, Winner::Rag);
        assert_eq!(compare::<Option<MetricReport>>(None, None).winner, Winner::Tie);
    }

    #[test]
    fn test_verdict_serialization_keys() {
        let json = serde_json::to_value(compare(card(6), card(7))).unwrap();
        assert_eq!(json["no_rag"]["total"], 30);
        assert_eq!(json["rag"]["total"], 35);
        assert_eq!(json["winner"], "rag");
    }

    #[test]
    fn test_winner_serialization() {
        assert_eq!(serde_json::to_string(&Winner::NoRag).unwrap(), "\"no-rag\"");
        assert_eq!(serde_json::to_string(&Winner::Tie).unwrap(), "\"tie\"");
        assert_eq!(Winner::Rag.to_string(), "RAG");
    }
}
