//! Fake collaborators shared by unit tests.

use crate::embedding::Embedder;
use crate::error::{AutodocError, Result};
use crate::llm::TextGenerator;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::Duration;

const DIMS: usize = 64;

/// Bag-of-words embedder: texts sharing words get similar vectors.
pub struct KeywordEmbedder {
    pub model: String,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            model: "keyword-test".to_string(),
        }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIMS];
                for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
                    let mut hasher = DefaultHasher::new();
                    word.to_lowercase().hash(&mut hasher);
                    v[(hasher.finish() as usize) % DIMS] += 1.0;
                }
                v
            })
            .collect())
    }
}

/// Embedder that fails once `fail_after` texts have been embedded.
pub struct FailingEmbedder {
    pub fail_after: usize,
    pub seen: Mutex<usize>,
}

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "keyword-test"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        {
            let mut seen = self.seen.lock().map_err(|e| AutodocError::Config(e.to_string()))?;
            if *seen + texts.len() > self.fail_after {
                return Err(AutodocError::RetrievalBackendUnavailable(
                    "connection refused".to_string(),
                ));
            }
            *seen += texts.len();
        }
        KeywordEmbedder::new().embed(texts).await
    }
}

/// Generator returning scripted replies and recording every prompt.
pub struct ScriptedGenerator {
    replies: Mutex<Vec<Result<String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Replies are handed out in order; the last one repeats.
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn failing() -> Self {
        Self::new(vec![Err(AutodocError::LlmApi("connection refused".to_string()))])
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let mut replies = self
            .replies
            .lock()
            .map_err(|e| AutodocError::Config(e.to_string()))?;
        if replies.len() > 1 {
            return replies.remove(0);
        }
        match replies.first() {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(e)) => Err(AutodocError::LlmApi(e.to_string())),
            None => Ok(String::new()),
        }
    }
}

/// Generator that takes `delay` to answer.
pub struct SlowGenerator {
    pub delay: Duration,
}

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok("late answer".to_string())
    }
}
