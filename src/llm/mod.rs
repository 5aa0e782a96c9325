//! Auxiliary text transforms.
//!
//! Small one-shot LLM calls used around the agent sessions: generating unit
//! titles, turning a proposed update into a command script, and composing
//! prompt snippets. Callers depend on the [`TextTransform`] trait so tests can
//! substitute deterministic stubs.

pub mod openai;
pub mod prompts;

use crate::Result;

pub use openai::ChatCompletionClient;

/// A request/response text transform backed by an LLM.
pub trait TextTransform: Send + Sync {
    /// Complete `user` under the given system prompt.
    fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// A short human-readable title for `text`.
    fn title(&self, text: &str) -> Result<String> {
        let title = self.complete(prompts::TITLE_SYSTEM, text)?;
        Ok(clean_title(&title))
    }

    /// Rewrite `text` into the structure described by `instructions`.
    fn coerce(&self, text: &str, instructions: &str) -> Result<String> {
        self.complete(instructions, text)
    }
}

/// First non-empty line of a title response, without quotes or markdown.
pub fn clean_title(raw: &str) -> String {
    raw.lines()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .trim_matches(|c| c == '"' || c == '\'' || c == '*' || c == '`')
        .trim()
        .to_string()
}
