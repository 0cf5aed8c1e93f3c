//! LLM integration module.
//!
//! Provides an OpenAI-compatible client for LLM API calls, the
//! [`TextGenerator`] seam the rest of the crate talks to, and the prompts
//! used for documentation generation, judging and question answering.

mod client;
mod prompts;

pub use client::{LlmClient, LlmResponse, Message, Role};
pub use prompts::Prompts;

use crate::error::Result;
use async_trait::async_trait;

/// A text-generation backend: rendered prompt in, completion text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String>;
}
