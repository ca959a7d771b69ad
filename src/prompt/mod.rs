//! Prompt text handed to a chat-completion model along with retrieved chunks.


use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Separator placed between retrieved chunks inside the prompt
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

const GUIDE_PERSONA: &str = "You are a helpful and knowledgeable museum guide.";

/// How much detail the model is asked to give
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Concise,
    Detailed,
}

impl ResponseMode {
    #[inline]
    pub fn system_instruction(self) -> String {
        let style = match self {
            Self::Concise => "Respond concisely and clearly.",
            Self::Detailed => "Provide detailed historical and artistic context.",
        };
        format!("{} {}", GUIDE_PERSONA, style)
    }
}

/// User prompt combining the retrieved chunks with the visitor's question
#[inline]
pub fn assemble_prompt(question: &str, chunks: &[String]) -> String {
    let context = chunks.join(CONTEXT_SEPARATOR);
    format!(
        "Use the following context to answer the user's question.{sep}{context}{sep}Question: {question}",
        sep = CONTEXT_SEPARATOR,
    )
}
