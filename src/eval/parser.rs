//! Extracts rubric scores and a rationale from free-form judge output.
//!
//! Judge models rarely follow the requested format exactly, so parsing runs
//! an ordered chain of [`ScoreStrategy`] implementations and keeps the first
//! one that produces scores:
//!
//! 1. a fenced ```` ```json ```` block containing every criterion,
//! 2. a bare `{ ... }` object mentioning `"completeness"` and containing
//!    every criterion,
//! 3. a per-criterion regex scan over the prose.
//!
//! Parsing never fails. When nothing matches, every criterion scores 0 and
//! the card records [`ParseStrategy::Unparsed`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Rubric criteria in presentation order.
pub const CRITERIA: [&str; 5] = [
    "completeness",
    "accuracy",
    "clarity",
    "structure",
    "context_enrichment",
];

/// Rationale used when the response is empty.
pub const NO_RATIONALE: &str = "No rationale provided.";

/// Characters of the response kept as a fallback rationale.
const RATIONALE_TAIL_CHARS: usize = 500;

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid fenced json regex"));

static BARE_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{[^{}]*"completeness"[^{}]*\}"#).expect("valid bare json regex")
});

static REASONING_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)"reasoning"\s*:\s*"([^"]+)""#).expect("valid reasoning field regex")
});

static RATIONALE_SECTION_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)reasoning[:\s]+(.*?)(?:\n\n|\z)",
        r"(?is)(?:explanation|summary|notes?)[:\s]+(.*?)(?:\n\n|\z)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid rationale regex"))
    .collect()
});

static CRITERION_RES: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    CRITERIA
        .iter()
        .map(|criterion| {
            let name = criterion.replace('_', r"[_\s-]");
            let patterns = [
                format!(r#"(?i)["']?{name}["']?\s*[:=]\s*([0-9]+)"#),
                format!(r"(?i){name}\s*[-–:]\s*([0-9]+)"),
                format!(r"(?i){name}[^0-9]*([0-9]+)\s*/\s*10"),
                format!(r"(?i){name}[^0-9]*([0-9]+)\s*(?:points?|pts)?"),
            ];
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid criterion regex"))
                .collect();
            (*criterion, compiled)
        })
        .collect()
});

/// Which strategy produced a score card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    FencedJson,
    BareJson,
    RegexScan,
    Unparsed,
}

/// Scores found by a strategy, plus a rationale if it carried one.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScores {
    pub scores: BTreeMap<String, u32>,
    pub reasoning: Option<String>,
}

/// Parsed rubric for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// Criterion name to score in 1..=10, or 0 when unparseable.
    /// Serialized as top-level keys beside `total`.
    #[serde(flatten)]
    pub scores: BTreeMap<String, u32>,
    pub total: u32,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub strategy: ParseStrategy,
}

impl ScoreCard {
    fn new(scores: BTreeMap<String, u32>, reasoning: String, strategy: ParseStrategy) -> Self {
        let total = CRITERIA
            .iter()
            .map(|c| scores.get(*c).copied().unwrap_or(0))
            .sum();
        Self {
            scores,
            total,
            reasoning,
            error: None,
            strategy,
        }
    }

    /// A zero card recording why the judge could not be consulted.
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        let mut card = Self::new(zero_scores(), format!("Evaluation failed: {}", error), ParseStrategy::Unparsed);
        card.error = Some(error);
        card
    }

    /// Score for one criterion (0 if absent).
    pub fn score(&self, criterion: &str) -> u32 {
        self.scores.get(criterion).copied().unwrap_or(0)
    }
}

/// One way of pulling scores out of a judge response.
pub trait ScoreStrategy: Send + Sync {
    fn kind(&self) -> ParseStrategy;

    /// Scores for every criterion, or `None` if this strategy does not apply.
    fn attempt(&self, text: &str) -> Option<ParsedScores>;
}

/// A ```` ```json ```` fenced block.
pub struct FencedJsonStrategy;

impl ScoreStrategy for FencedJsonStrategy {
    fn kind(&self) -> ParseStrategy {
        ParseStrategy::FencedJson
    }

    fn attempt(&self, text: &str) -> Option<ParsedScores> {
        let caps = FENCED_JSON_RE.captures(text)?;
        scores_from_json(caps.get(1)?.as_str())
    }
}

/// A flat JSON object mentioning `"completeness"`.
pub struct BareJsonStrategy;

impl ScoreStrategy for BareJsonStrategy {
    fn kind(&self) -> ParseStrategy {
        ParseStrategy::BareJson
    }

    fn attempt(&self, text: &str) -> Option<ParsedScores> {
        let found = BARE_JSON_RE.find(text)?;
        scores_from_json(found.as_str())
    }
}

/// Per-criterion patterns such as `Completeness: 8` or `clarity 7/10`.
pub struct RegexScanStrategy;

impl ScoreStrategy for RegexScanStrategy {
    fn kind(&self) -> ParseStrategy {
        ParseStrategy::RegexScan
    }

    fn attempt(&self, text: &str) -> Option<ParsedScores> {
        let mut scores = BTreeMap::new();
        let mut found_any = false;

        for (criterion, patterns) in CRITERION_RES.iter() {
            let value = patterns
                .iter()
                .filter_map(|re| re.captures(text))
                .filter_map(|caps| caps[1].parse::<u32>().ok())
                .find(|v| (1..=10).contains(v));
            found_any |= value.is_some();
            scores.insert(criterion.to_string(), value.unwrap_or(0));
        }

        found_any.then_some(ParsedScores {
            scores,
            reasoning: None,
        })
    }
}

/// Ordered strategy chain turning raw judge output into a [`ScoreCard`].
pub struct JudgeScoreParser {
    strategies: Vec<Box<dyn ScoreStrategy>>,
}

impl Default for JudgeScoreParser {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(FencedJsonStrategy),
                Box::new(BareJsonStrategy),
                Box::new(RegexScanStrategy),
            ],
        }
    }
}

impl JudgeScoreParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a parser from a custom strategy chain.
    pub fn with_strategies(strategies: Vec<Box<dyn ScoreStrategy>>) -> Self {
        Self { strategies }
    }

    /// Parse a judge response. Never fails.
    pub fn parse(&self, raw: &str) -> ScoreCard {
        for strategy in &self.strategies {
            if let Some(parsed) = strategy.attempt(raw) {
                let reasoning = parsed
                    .reasoning
                    .filter(|r| !r.trim().is_empty())
                    .map(|r| r.trim().to_string())
                    .unwrap_or_else(|| extract_rationale(raw));
                return ScoreCard::new(parsed.scores, reasoning, strategy.kind());
            }
        }

        ScoreCard::new(zero_scores(), extract_rationale(raw), ParseStrategy::Unparsed)
    }
}

/// Rationale from a labelled section, else the tail of the response.
pub fn extract_rationale(raw: &str) -> String {
    if let Some(caps) = REASONING_FIELD_RE.captures(raw) {
        let text = caps[1].trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }

    for re in RATIONALE_SECTION_RES.iter() {
        if let Some(caps) = re.captures(raw) {
            let text = caps[1].trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    let char_count = raw.chars().count();
    let tail: String = raw
        .chars()
        .skip(char_count.saturating_sub(RATIONALE_TAIL_CHARS))
        .collect();
    let tail = tail.trim();
    if tail.is_empty() {
        NO_RATIONALE.to_string()
    } else {
        tail.to_string()
    }
}

fn zero_scores() -> BTreeMap<String, u32> {
    CRITERIA.iter().map(|c| (c.to_string(), 0)).collect()
}

/// Scores from a JSON object that has every criterion key.
fn scores_from_json(json: &str) -> Option<ParsedScores> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    let object = value.as_object()?;
    if !CRITERIA.iter().all(|c| object.contains_key(*c)) {
        return None;
    }

    let scores = CRITERIA
        .iter()
        .map(|c| (c.to_string(), object.get(*c).map_or(0, score_from_value)))
        .collect();
    let reasoning = object
        .get("reasoning")
        .and_then(|r| r.as_str())
        .map(str::to_string);

    Some(ParsedScores { scores, reasoning })
}

/// Integer in 1..=10, else 0. Whole floats and numeric strings count.
fn score_from_value(value: &serde_json::Value) -> u32 {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if (1..=10).contains(&v) => v as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ScoreCard {
        JudgeScoreParser::new().parse(raw)
    }

    #[test]
    fn test_fenced_json() {
        let raw = r#"Here is my evaluation:
```json
{
  "completeness": 8,
  "accuracy": 9,
  "clarity": 7,
  "structure": 8,
  "context_enrichment": 3,
  "reasoning": "Thorough but no external references."
}
```"#;
        let card = parse(raw);
        assert_eq!(card.strategy, ParseStrategy::FencedJson);
        assert_eq!(card.score("completeness"), 8);
        assert_eq!(card.score("context_enrichment"), 3);
        assert_eq!(card.total, 35);
        assert_eq!(card.reasoning, "Thorough but no external references.");
        assert_eq!(card.scores.len(), 5);
    }

    #[test]
    fn test_bare_json_object() {
        let raw = r#"Scores: {"completeness": 6, "accuracy": 7, "clarity": 8, "structure": 9, "context_enrichment": 10} done"#;
        let card = parse(raw);
        assert_eq!(card.strategy, ParseStrategy::BareJson);
        assert_eq!(card.total, 40);
    }

    #[test]
    fn test_incomplete_json_falls_through() {
        let raw = "```json\n{\"completeness\": 8}\n```";
        let card = parse(raw);
        assert_eq!(card.strategy, ParseStrategy::RegexScan);
        assert_eq!(card.score("completeness"), 8);
        assert_eq!(card.score("accuracy"), 0);
    }

    #[test]
    fn test_out_of_range_json_values_become_zero() {
        let raw = r#"{"completeness": 11, "accuracy": "7", "clarity": 7.0, "structure": 7.5, "context_enrichment": null}"#;
        let card = parse(raw);
        assert_eq!(card.strategy, ParseStrategy::BareJson);
        assert_eq!(card.score("completeness"), 0);
        assert_eq!(card.score("accuracy"), 7);
        assert_eq!(card.score("clarity"), 7);
        assert_eq!(card.score("structure"), 0);
        assert_eq!(card.score("context_enrichment"), 0);
        assert_eq!(card.total, 14);
    }

    #[test]
    fn test_prose_scores() {
        let card = parse("completeness: 7\nAccuracy - 9");
        assert_eq!(card.strategy, ParseStrategy::RegexScan);
        assert_eq!(card.score("completeness"), 7);
        assert_eq!(card.score("accuracy"), 9);
        assert_eq!(card.score("clarity"), 0);
        assert_eq!(card.score("structure"), 0);
        assert_eq!(card.score("context_enrichment"), 0);
        assert_eq!(card.total, 16);
        assert!(!card.reasoning.is_empty());
    }

    #[test]
    fn test_prose_variants() {
        let raw = "Clarity 8/10. Structure earns 6 points. Context enrichment = 2.";
        let card = parse(raw);
        assert_eq!(card.score("clarity"), 8);
        assert_eq!(card.score("structure"), 6);
        assert_eq!(card.score("context_enrichment"), 2);
    }

    #[test]
    fn test_out_of_range_prose_is_zero() {
        let card = parse("Completeness: 15");
        assert_eq!(card.score("completeness"), 0);
    }

    #[test]
    fn test_unparseable_response() {
        let card = parse("The documentation looks fine overall.");
        assert_eq!(card.strategy, ParseStrategy::Unparsed);
        assert_eq!(card.total, 0);
        assert_eq!(card.scores.len(), 5);
        assert_eq!(card.reasoning, "The documentation looks fine overall.");
    }

    #[test]
    fn test_empty_response_has_placeholder_rationale() {
        let card = parse("");
        assert_eq!(card.total, 0);
        assert_eq!(card.reasoning, NO_RATIONALE);
    }

    #[test]
    fn test_labelled_rationale() {
        let raw = "Completeness: 8\n\nExplanation: Covers every method.\nGood examples.\n\nThanks!";
        let card = parse(raw);
        assert_eq!(card.reasoning, "Covers every method.\nGood examples.");
    }

    #[test]
    fn test_rationale_tail_is_bounded() {
        let raw = "x".repeat(2000);
        assert_eq!(extract_rationale(&raw).chars().count(), RATIONALE_TAIL_CHARS);
    }

    #[test]
    fn test_failed_card() {
        let card = ScoreCard::failed("connection refused");
        assert_eq!(card.total, 0);
        assert_eq!(card.error.as_deref(), Some("connection refused"));
        assert!(card.reasoning.contains("connection refused"));

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["strategy"], "unparsed");
        assert_eq!(json["error"], "connection refused");
    }

    #[test]
    fn test_card_json_keeps_criteria_beside_total() {
        let card = JudgeScoreParser::new()
            .parse("completeness: 7\naccuracy: 8\nclarity: 9\nstructure: 6\ncontext_enrichment: 3");
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["clarity"], 9);
        assert_eq!(json["context_enrichment"], 3);
        assert_eq!(json["total"], 33);
        assert!(json.get("scores").is_none());

        let loaded: ScoreCard = serde_json::from_value(json).unwrap();
        assert_eq!(loaded, card);
    }

    #[test]
    fn test_custom_strategy_chain() {
        let parser = JudgeScoreParser::with_strategies(vec![Box::new(RegexScanStrategy)]);
        let raw = "```json\n{\"completeness\": 8, \"accuracy\": 8, \"clarity\": 8, \"structure\": 8, \"context_enrichment\": 8}\n```";
        let card = parser.parse(raw);
        assert_eq!(card.strategy, ParseStrategy::RegexScan);
        assert_eq!(card.total, 40);
    }
}
