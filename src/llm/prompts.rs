//! Prompt templates for documentation generation, judging and Q&A.
//!
//! Templates use `{name}` placeholders filled by [`Prompts::render`] in a
//! single pass. Literal braces in the JSON examples are left alone because
//! they never enclose a bare lowercase name.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder regex"));

/// Collection of prompts used by the generator, judge and ask agent.
pub struct Prompts;

impl Prompts {
    /// Fill `{name}` placeholders from `values`.
    ///
    /// Substituted text is never scanned again, so a value that itself
    /// contains `{file_content}` stays verbatim. Unknown placeholders are
    /// left as written.
    pub fn render(template: &str, values: &[(&str, &str)]) -> String {
        PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures| {
                values
                    .iter()
                    .find(|(name, _)| *name == &caps[1])
                    .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
            })
            .into_owned()
    }

    /// Baseline documentation prompt: source file only.
    ///
    /// Placeholders: `{file_name}`, `{file_content}`.
    pub fn doc_baseline() -> &'static str {
        r#"You are an expert technical writer and software engineer.
Write comprehensive API documentation for the source file "{file_name}".

Analyze the code below and produce a structured Markdown document containing:
1. **Module Overview**: what this file or module does.
2. **Classes/Structs**: for each one, a description, public/protected members, and
   every method (signature, description, parameters, return value).
3. **Functions**: for each free function, its signature, description, parameters
   and return value.
4. **Usage Example**: a snippet showing how to use the key components, inferred
   from the code.

Rules:
- Use GitHub Flavored Markdown and a professional, clear tone.
- Do not invent behavior that is not present in the code.
- For header files, focus on the interface; for implementation files, on the logic.

---
**Source Code**:
```
{file_content}
```

**Markdown Output**:
"#
    }

    /// Retrieval-augmented documentation prompt.
    ///
    /// Placeholders: `{file_name}`, `{file_content}`, `{rag_context}`.
    pub fn doc_augmented() -> &'static str {
        r#"You are an expert technical writer and software engineer.
Write comprehensive API documentation for the source file "{file_name}".

Reference material retrieved from a knowledge base is provided below. Use it to
bring in the right terminology from design documents, connect the code to related
components, and apply conventions from style guides.

**Reference Context**:
{rag_context}

---

Analyze the code below and produce a structured Markdown document containing:
1. **Module Overview**: what this file or module does, citing architecture documents
   where relevant.
2. **Classes/Structs**: for each one, a description (enriched by the references when
   they apply), public/protected members, and every method (signature, description,
   parameters, return value).
3. **Functions**: for each free function, its signature, description, parameters
   and return value.
4. **Usage Example**: a snippet showing how to use the key components.
5. **Related References**: design documents or standards from the context that
   relate to this code.

Rules:
- Use GitHub Flavored Markdown and a professional, clear tone.
- Combine code analysis with the retrieved context.
- Where the context does not apply to part of the code, rely on the code alone.

---
**Source Code**:
```
{file_content}
```

**Markdown Output**:
"#
    }

    /// LLM-as-judge rubric for one generated document.
    ///
    /// Placeholders: `{source_code}`, `{doc_content}`.
    pub fn judge_rubric() -> &'static str {
        r#"You are an expert reviewer of technical documentation.
Evaluate the quality of API documentation that was generated from source code.

**Evaluation Criteria** (score each from 1 to 10):
1. **Completeness & Detail**: are all classes, methods, parameters and return values
   covered with detailed descriptions? Bare summaries deserve low scores.
2. **Accuracy & Insight**: are the descriptions correct, and do they add insight
   beyond reading the code?
3. **Clarity**: is it easy for a developer to follow?
4. **Structure & Professionalism**: is the Markdown well organized, comparable to
   official library documentation?
5. **Context Enrichment (CRITICAL)**: does it reference external standards, design
   patterns or related architecture? **If it mentions no external context or
   references, this category scores at most 2.**

---

**Original Source Code** (ground truth):
```
{source_code}
```

---

**Documentation to Evaluate**:
{doc_content}

---

Answer in exactly this JSON format:
```json
{
  "completeness": <score 1-10>,
  "accuracy": <score 1-10>,
  "clarity": <score 1-10>,
  "structure": <score 1-10>,
  "context_enrichment": <score 1-10>,
  "reasoning": "<brief explanation of the scores>"
}
```
"#
    }

    /// Retrieval-grounded question answering for the interactive agent.
    ///
    /// Placeholders: `{context}`, `{question}`.
    pub fn rag_answer() -> &'static str {
        r#"You are an expert assistant for middleware developers.
Answer the question using the retrieved context below. If the context does not
contain the answer, say "I don't have enough information in the provided documents
to answer that." Keep the answer technical, concise and accurate.

Context:
{context}

Question: {question}

Answer:"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_not_empty() {
        assert!(!Prompts::doc_baseline().is_empty());
        assert!(!Prompts::doc_augmented().is_empty());
        assert!(!Prompts::judge_rubric().is_empty());
        assert!(!Prompts::rag_answer().is_empty());
    }

    #[test]
    fn test_placeholders_present() {
        assert!(Prompts::doc_baseline().contains("{file_content}"));
        assert!(!Prompts::doc_baseline().contains("{rag_context}"));
        assert!(Prompts::doc_augmented().contains("{rag_context}"));
        assert!(Prompts::judge_rubric().contains("{doc_content}"));
        assert!(Prompts::rag_answer().contains("{question}"));
    }

    #[test]
    fn test_render_is_single_pass() {
        let rendered = Prompts::render(
            "A={a} B={b} C={c}",
            &[("a", "uses {b} inside"), ("b", "two")],
        );
        assert_eq!(rendered, "A=uses {b} inside B=two C={c}");
    }

    #[test]
    fn test_render_keeps_json_braces() {
        let rendered = Prompts::render(Prompts::judge_rubric(), &[("source_code", "x"), ("doc_content", "y")]);
        assert!(rendered.contains("\"context_enrichment\": <score 1-10>"));
        assert!(!rendered.contains("{doc_content}"));
    }
}
