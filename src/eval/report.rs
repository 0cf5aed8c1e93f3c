//! Result files and console summaries for both evaluation paths.

use super::comparator::{Verdict, Winner, compare};
use super::metrics::{AutoMetricScorer, MetricReport};
use super::parser::{CRITERIA, ScoreCard};
use crate::error::Result;
use crate::persistence;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Default result file for judge runs.
pub const JUDGE_RESULTS_FILE: &str = "evaluation_results.json";
/// Default result file for metric runs.
pub const BLEU_RESULTS_FILE: &str = "bleu_results.json";

/// Judge scores for both modes of one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeReport {
    pub source_file: String,
    #[serde(flatten)]
    pub verdict: Verdict<ScoreCard>,
}

impl JudgeReport {
    pub fn winner(&self) -> Winner {
        self.verdict.winner
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        persistence::save_json(self, path)
    }

    /// Criterion table with totals and the winner.
    pub fn summary(&self) -> String {
        let no_rag = &self.verdict.baseline;
        let rag = &self.verdict.augmented;
        let mut out = String::new();

        let _ = writeln!(out, "\n{}", "=".repeat(50));
        let _ = writeln!(out, "EVALUATION RESULTS: {}", self.source_file);
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out, "\n{:<20} {:>10} {:>10}", "Criterion", "No-RAG", "RAG");
        let _ = writeln!(out, "{}", "-".repeat(42));
        for criterion in CRITERIA {
            let _ = writeln!(
                out,
                "{:<20} {:>10} {:>10}",
                criterion,
                no_rag.score(criterion),
                rag.score(criterion)
            );
        }
        let _ = writeln!(out, "{}", "-".repeat(42));
        let _ = writeln!(out, "{:<20} {:>10} {:>10}", "TOTAL", no_rag.total, rag.total);
        for (label, card) in [("No-RAG", no_rag), ("RAG", rag)] {
            if let Some(error) = &card.error {
                let _ = writeln!(out, "{} evaluation failed: {}", label, error);
            }
        }
        let _ = writeln!(out, "\nWinner: {}", self.verdict.winner);
        out
    }

    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }
}

/// Automatic metrics for both modes against one reference document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricComparison {
    pub ground_truth: String,
    #[serde(flatten)]
    pub verdict: Verdict<Option<MetricReport>>,
}

impl MetricComparison {
    /// Score whichever candidates are present. A missing side counts as 0.
    pub fn score(
        ground_truth: &str,
        reference: &str,
        no_rag: Option<&str>,
        rag: Option<&str>,
    ) -> Self {
        let scorer = AutoMetricScorer;
        let baseline = no_rag.map(|doc| scorer.score(reference, doc));
        let augmented = rag.map(|doc| scorer.score(reference, doc));
        Self {
            ground_truth: ground_truth.to_string(),
            verdict: compare(baseline, augmented),
        }
    }

    pub fn winner(&self) -> Winner {
        self.verdict.winner
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        persistence::save_json(self, path)
    }

    /// BLEU and overlap tables with the RAG minus No-RAG delta.
    pub fn summary(&self) -> String {
        let no_rag = self.verdict.baseline.unwrap_or_default();
        let rag = self.verdict.augmented.unwrap_or_default();
        let mut out = String::new();

        let _ = writeln!(out, "\n{}", "=".repeat(60));
        let _ = writeln!(out, "BLEU SCORE COMPARISON");
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "\n{:<20} {:>12} {:>12} {:>10}", "Metric", "No-RAG", "RAG", "Delta");
        let _ = writeln!(out, "{}", "-".repeat(54));
        let bleu_rows = [
            ("BLEU_1", no_rag.bleu.bleu_1, rag.bleu.bleu_1),
            ("BLEU_2", no_rag.bleu.bleu_2, rag.bleu.bleu_2),
            ("BLEU_3", no_rag.bleu.bleu_3, rag.bleu.bleu_3),
            ("BLEU_4", no_rag.bleu.bleu_4, rag.bleu.bleu_4),
        ];
        for (name, a, b) in bleu_rows {
            write_metric_row(&mut out, name, a, b);
        }
        let _ = writeln!(out, "{}", "-".repeat(54));

        let _ = writeln!(out, "\nTOKEN OVERLAP (vs Ground Truth)");
        let _ = writeln!(out, "{}", "-".repeat(54));
        let overlap_rows = [
            ("Precision", no_rag.overlap.precision, rag.overlap.precision),
            ("Recall", no_rag.overlap.recall, rag.overlap.recall),
            ("F1", no_rag.overlap.f1, rag.overlap.f1),
        ];
        for (name, a, b) in overlap_rows {
            write_metric_row(&mut out, name, a, b);
        }

        let _ = writeln!(out, "\n{}", "=".repeat(60));
        match self.verdict.winner {
            Winner::Tie => {
                let _ = writeln!(out, "Winner (BLEU-4): TIE ({:.2}%)", no_rag.bleu.bleu_4);
            }
            Winner::Rag => {
                let _ = writeln!(
                    out,
                    "Winner (BLEU-4): RAG ({:.2}% vs {:.2}%)",
                    rag.bleu.bleu_4, no_rag.bleu.bleu_4
                );
            }
            Winner::NoRag => {
                let _ = writeln!(
                    out,
                    "Winner (BLEU-4): No-RAG ({:.2}% vs {:.2}%)",
                    no_rag.bleu.bleu_4, rag.bleu.bleu_4
                );
            }
        }
        let _ = writeln!(out, "{}", "=".repeat(60));
        out
    }

    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }
}

fn write_metric_row(out: &mut String, name: &str, no_rag: f64, rag: f64) {
    let delta = rag - no_rag;
    let delta = if delta >= 0.0 {
        format!("+{:.2}", delta)
    } else {
        format!("{:.2}", delta)
    };
    let _ = writeln!(out, "{:<20} {:>11.2}% {:>11.2}% {:>10}", name, no_rag, rag, delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::parser::JudgeScoreParser;
    use tempfile::TempDir;

    fn judge_report() -> JudgeReport {
        let parser = JudgeScoreParser::new();
        let no_rag = parser.parse("completeness: 7\naccuracy: 8\nclarity: 8\nstructure: 7\ncontext_enrichment: 2");
        let rag = ScoreCard::failed("timeout");
        JudgeReport {
            source_file: "docs/sample_middleware.cpp".to_string(),
            verdict: compare(no_rag, rag),
        }
    }

    #[test]
    fn test_judge_report_json_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(JUDGE_RESULTS_FILE);
        let report = judge_report();
        report.save(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["source_file"], "docs/sample_middleware.cpp");
        assert_eq!(json["no_rag"]["total"], 32);
        assert_eq!(json["no_rag"]["clarity"], 8);
        assert!(json["no_rag"].get("scores").is_none());
        assert_eq!(json["rag"]["total"], 0);
        assert_eq!(json["rag"]["error"], "timeout");
        assert_eq!(json["winner"], "no-rag");

        let loaded: JudgeReport = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.winner(), Winner::NoRag);
    }

    #[test]
    fn test_judge_summary() {
        let summary = judge_report().summary();
        assert!(summary.contains("context_enrichment"));
        assert!(summary.contains("TOTAL"));
        assert!(summary.contains("RAG evaluation failed: timeout"));
        assert!(summary.contains("Winner: No-RAG"));
    }

    #[test]
    fn test_metric_comparison() {
        let reference = "The bus delivers every event to each subscriber in order.";
        let comparison = MetricComparison::score(
            "gt.md",
            reference,
            Some("A bus exists."),
            Some("The bus delivers every event to each subscriber in order."),
        );
        assert_eq!(comparison.winner(), Winner::Rag);
        let rag = comparison.verdict.augmented.unwrap();
        assert_eq!(rag.bleu.bleu_4, 100.0);

        let summary = comparison.summary();
        assert!(summary.contains("BLEU_4"));
        assert!(summary.contains("Winner (BLEU-4): RAG"));
    }

    #[test]
    fn test_metric_comparison_missing_side() {
        let comparison = MetricComparison::score("gt.md", "alpha beta", None, None);
        assert_eq!(comparison.winner(), Winner::Tie);
        assert!(comparison.verdict.tie_break_rule_applied);

        let json = serde_json::to_value(&comparison).unwrap();
        assert!(json["no_rag"].is_null());
        assert_eq!(json["winner"], "tie");
        assert!(comparison.summary().contains("TIE"));
    }

    #[test]
    fn test_metric_comparison_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join(BLEU_RESULTS_FILE);
        let comparison = MetricComparison::score("gt.md", "alpha beta gamma", Some("alpha"), None);
        comparison.save(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"bleu_4\""));
        assert!(content.contains("\"overlap_tokens\""));
    }
}
