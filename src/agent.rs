//! Interactive question answering over the reference index.

use crate::error::Result;
use crate::llm::{Prompts, TextGenerator};
use crate::retriever::{EMPTY_CONTEXT, RetrievalResult, Retriever};
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// An answer and the sources it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Distinct source URIs of the retrieved chunks, in rank order.
    pub sources: Vec<String>,
}

/// Whether a line ends the interactive session.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit" | "q")
}

/// Retrieval-grounded question answering.
pub struct AskAgent<'a> {
    llm: &'a dyn TextGenerator,
    retriever: &'a Retriever<'a>,
    top_k: usize,
}

impl<'a> AskAgent<'a> {
    pub fn new(llm: &'a dyn TextGenerator, retriever: &'a Retriever<'a>, top_k: usize) -> Self {
        Self {
            llm,
            retriever,
            top_k,
        }
    }

    /// Prompt with retrieved chunk texts as context.
    pub fn render_prompt(question: &str, retrieved: &RetrievalResult) -> String {
        let context = if retrieved.is_empty() {
            EMPTY_CONTEXT.to_string()
        } else {
            retrieved
                .hits
                .iter()
                .map(|hit| hit.chunk.text.trim())
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        Prompts::render(
            Prompts::rag_answer(),
            &[("context", &context), ("question", question)],
        )
    }

    /// Answer one question.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let retrieved = self.retriever.retrieve(question, self.top_k).await?;
        debug!(hits = retrieved.len(), "retrieved context for question");

        let prompt = Self::render_prompt(question, &retrieved);
        let text = self.llm.invoke(&prompt).await?;

        Ok(Answer {
            text: text.trim().to_string(),
            sources: retrieved.sources().into_iter().map(str::to_string).collect(),
        })
    }

    /// Read questions line by line until an exit command, end of input or
    /// Ctrl-C. Returns how many questions were answered.
    pub async fn run<R>(&self, input: R) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        self.run_until(input, tokio::signal::ctrl_c()).await
    }

    /// Like [`AskAgent::run`], but stops when `interrupt` completes, whether
    /// the loop is waiting for input or for an answer.
    pub async fn run_until<R, F>(&self, input: R, interrupt: F) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        F: Future,
    {
        tokio::pin!(interrupt);
        let mut lines = input.lines();
        let mut answered = 0usize;

        loop {
            print!("\n>> Question: ");
            let _ = std::io::stdout().flush();

            let line = tokio::select! {
                line = lines.next_line() => line,
                _ = &mut interrupt => {
                    println!();
                    break;
                }
            };

            let question = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    println!();
                    break;
                }
                Err(e) => {
                    warn!("failed to read input: {}", e);
                    break;
                }
            };

            let question = question.trim();
            if question.is_empty() {
                continue;
            }
            if is_exit_command(question) {
                break;
            }

            println!("Thinking...");
            let outcome = tokio::select! {
                outcome = self.ask(question) => outcome,
                _ = &mut interrupt => {
                    println!();
                    break;
                }
            };
            match outcome {
                Ok(answer) => {
                    answered += 1;
                    println!("\n>> Answer:\n{}\n", answer.text);
                    println!("[Referenced Sources]");
                    for (i, source) in answer.sources.iter().enumerate() {
                        println!("{}. {}", i + 1, source);
                    }
                }
                Err(e) => println!("Error occurred: {}", e),
            }
        }

        println!("Goodbye!");
        Ok(answered)
    }
}
