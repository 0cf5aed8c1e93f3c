//! LLM-as-judge scoring of generated documentation.

use super::comparator::compare;
use super::parser::{JudgeScoreParser, ScoreCard};
use super::report::JudgeReport;
use crate::llm::{Prompts, TextGenerator};
use tracing::{info, warn};

/// Scores documentation against its source with a rubric prompt.
pub struct DocJudge<'a> {
    llm: &'a dyn TextGenerator,
    parser: JudgeScoreParser,
}

impl<'a> DocJudge<'a> {
    /// Create a judge using the default parse strategies.
    pub fn new(llm: &'a dyn TextGenerator) -> Self {
        Self {
            llm,
            parser: JudgeScoreParser::default(),
        }
    }

    /// Render the rubric prompt for one document.
    pub fn render_prompt(source_code: &str, doc_content: &str) -> String {
        Prompts::render(
            Prompts::judge_rubric(),
            &[("source_code", source_code), ("doc_content", doc_content)],
        )
    }

    /// Score one document. A failed judge call yields a zero card with the
    /// error recorded.
    pub async fn score(&self, source_code: &str, doc_content: &str) -> ScoreCard {
        let prompt = Self::render_prompt(source_code, doc_content);
        match self.llm.invoke(&prompt).await {
            Ok(response) => {
                let card = self.parser.parse(&response);
                info!(total = card.total, strategy = ?card.strategy, "parsed judge response");
                card
            }
            Err(e) => {
                warn!(collaborator = e.is_collaborator_failure(), "judge call failed: {}", e);
                ScoreCard::failed(e.to_string())
            }
        }
    }

    /// Judge baseline and augmented documentation for the same source.
    pub async fn evaluate(
        &self,
        source_file: &str,
        source_code: &str,
        baseline_doc: &str,
        augmented_doc: &str,
    ) -> JudgeReport {
        info!(source = source_file, "judging no-rag documentation");
        let baseline = self.score(source_code, baseline_doc).await;
        info!(source = source_file, "judging rag documentation");
        let augmented = self.score(source_code, augmented_doc).await;

        JudgeReport {
            source_file: source_file.to_string(),
            verdict: compare(baseline, augmented),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutodocError;
    use crate::eval::comparator::Winner;
    use crate::eval::parser::ParseStrategy;
    use crate::testing::ScriptedGenerator;

    const GOOD: &str = r#"```json
{"completeness": 8, "accuracy": 8, "clarity": 8, "structure": 8, "context_enrichment": 8, "reasoning": "Rich."}
```"#;
    const WEAK: &str = "Completeness: 6\nAccuracy: 7\nClarity: 8\nStructure: 7\nContext enrichment: 2";

    #[test]
    fn test_render_prompt_fills_placeholders() {
        let prompt = DocJudge::render_prompt("int main() {}", "# Main");
        assert!(prompt.contains("int main() {}"));
        assert!(prompt.contains("# Main"));
        assert!(!prompt.contains("{source_code}"));
        assert!(!prompt.contains("{doc_content}"));
    }

    #[test]
    fn test_source_with_placeholder_text_is_kept_verbatim() {
        let prompt = DocJudge::render_prompt("// emits {doc_content} verbatim", "UNDER_REVIEW");
        assert_eq!(prompt.matches("UNDER_REVIEW").count(), 1);
        assert!(prompt.contains("// emits {doc_content} verbatim"));
    }

    #[tokio::test]
    async fn test_evaluate_declares_winner() {
        let llm = ScriptedGenerator::new(vec![Ok(WEAK.to_string()), Ok(GOOD.to_string())]);
        let judge = DocJudge::new(&llm);

        let report = judge.evaluate("bus.cpp", "class Bus {};", "baseline", "augmented").await;
        assert_eq!(llm.calls(), 2);
        assert_eq!(report.verdict.baseline.total, 30);
        assert_eq!(report.verdict.baseline.strategy, ParseStrategy::RegexScan);
        assert_eq!(report.verdict.augmented.total, 40);
        assert_eq!(report.verdict.augmented.reasoning, "Rich.");
        assert_eq!(report.verdict.winner, Winner::Rag);

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("baseline"));
        assert!(prompts[1].contains("augmented"));
    }

    #[tokio::test]
    async fn test_collaborator_failure_gives_zero_card() {
        let llm = ScriptedGenerator::new(vec![
            Err(AutodocError::LlmApi("connection refused".to_string())),
            Ok(WEAK.to_string()),
        ]);
        let judge = DocJudge::new(&llm);

        let report = judge.evaluate("bus.cpp", "class Bus {};", "a", "b").await;
        assert_eq!(report.verdict.baseline.total, 0);
        assert!(report.verdict.baseline.error.as_deref().unwrap().contains("connection refused"));
        assert_eq!(report.verdict.augmented.total, 30);
        assert_eq!(report.verdict.winner, Winner::Rag);
    }

    #[tokio::test]
    async fn test_both_failing_is_tie() {
        let llm = ScriptedGenerator::failing();
        let judge = DocJudge::new(&llm);
        let report = judge.evaluate("bus.cpp", "", "a", "b").await;
        assert_eq!(report.verdict.winner, Winner::Tie);
        assert!(report.verdict.tie_break_rule_applied);
    }
}
