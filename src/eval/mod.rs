//! Evaluation of generated documentation.
//!
//! This module provides:
//! - Automatic metrics against a reference document (BLEU-1..4, token overlap)
//! - LLM-as-judge rubric scoring with a tolerant score parser
//! - Winner selection and result files for both paths

pub mod comparator;
pub mod judge;
pub mod metrics;
pub mod parser;
pub mod report;

pub use comparator::{Scored, Verdict, Winner, compare};
pub use judge::DocJudge;
pub use metrics::{AutoMetricScorer, BleuScores, MetricReport, OverlapScores};
pub use parser::{CRITERIA, JudgeScoreParser, ParseStrategy, ScoreCard, ScoreStrategy};
pub use report::{BLEU_RESULTS_FILE, JUDGE_RESULTS_FILE, JudgeReport, MetricComparison};
