//! Query orchestration: prompt assembly, the single generate call, and the
//! moderation gate in front of operator-edited re-queries.

use std::sync::Arc;

use anyhow::Result;

use crate::llm::ModelEndpoint;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Advisory shown in place of a revised answer when moderation flags the
/// proposed steps. Displayed verbatim.
pub const MODERATION_REJECTION: &str =
    "The modified steps violate the content policy. Please revise.";

pub fn build_prompt(question: &str, context: &str, file_content: Option<&str>) -> String {
    let mut prompt = format!("Context: {context}\n\nQuestion: {question}");
    match file_content {
        Some(content) => prompt.push_str(&format!("\n\nAttached File Content: {content}\nAnswer:")),
        None => prompt.push_str("\nAnswer:"),
    }
    prompt
}

/// Result of a moderated re-query: either the gate refused the proposed steps
/// and the model was never asked, or the model answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reviewed {
    Rejected,
    Answer(String),
}

impl Reviewed {
    /// Text to place in the revised-answer slot.
    pub fn into_text(self) -> String {
        match self {
            Reviewed::Rejected => MODERATION_REJECTION.to_string(),
            Reviewed::Answer(answer) => answer,
        }
    }
}

pub struct Orchestrator {
    endpoint: Arc<dyn ModelEndpoint>,
}

impl Orchestrator {
    pub fn new(endpoint: Arc<dyn ModelEndpoint>) -> Self {
        Self { endpoint }
    }

    /// One generate call with the fixed system instruction. Remote failures
    /// propagate to the caller; no retry is attempted.
    pub async fn query(
        &self,
        question: &str,
        context: &str,
        file_content: Option<&str>,
    ) -> Result<String> {
        let prompt = build_prompt(question, context, file_content);
        let answer = self.endpoint.generate(SYSTEM_PROMPT, &prompt).await?;
        Ok(answer.trim().to_string())
    }

    /// Two-stage pipeline with an early exit: the proposed steps go through
    /// moderation first, and only a clean result reaches the model. A flagged
    /// result short-circuits without touching the generate endpoint.
    pub async fn moderate_and_query(
        &self,
        question: &str,
        proposed_steps: &str,
        file_content: Option<&str>,
    ) -> Result<Reviewed> {
        if self.endpoint.moderate(proposed_steps).await? {
            return Ok(Reviewed::Rejected);
        }
        let answer = self.query(question, proposed_steps, file_content).await?;
        Ok(Reviewed::Answer(answer))
    }
}
