//! Suggestion client - free-text "bought together" names from a chat model
//!
//! This crate is the only place that talks to a language model. It:
//! - Builds the one-line suggestion prompt (`prompt`)
//! - Sends it to an OpenAI-compatible or Ollama chat endpoint (`llm`)
//! - Parses the reply into a list of names (`provider`)
//!
//! # Safety Principle
//!
//! The model only proposes names. Whether a name becomes a recommendation is
//! decided by catalog validation in `aislefinder-core`; nothing the model says
//! reaches the shopper unvalidated.

pub mod llm;
pub mod prompt;
pub mod provider;

pub use llm::{LlmClient, MissingContent, OllamaChatClient, OpenAiChatClient};
pub use prompt::suggestion_prompt;
pub use provider::{provider_from_config, DisabledSuggestions, LlmSuggestionProvider};
