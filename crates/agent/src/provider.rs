use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use aislefinder_core::config::{SuggestionProviderKind, SuggestionsConfig};
use aislefinder_core::recommendations::{
    parse_suggestion_list, SuggestionError, SuggestionProvider,
};

use crate::llm::{LlmClient, MissingContent, OllamaChatClient, OpenAiChatClient};
use crate::prompt::suggestion_prompt;

/// Asks a chat model for names and parses its reply as a JSON string array.
pub struct LlmSuggestionProvider<C> {
    client: C,
}

impl<C> LlmSuggestionProvider<C>
where
    C: LlmClient,
{
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C> SuggestionProvider for LlmSuggestionProvider<C>
where
    C: LlmClient,
{
    async fn suggest(
        &self,
        context_name: &str,
        count: usize,
    ) -> Result<Vec<String>, SuggestionError> {
        let prompt = suggestion_prompt(context_name, count);
        let content = self.client.complete(&prompt).await.map_err(|error| {
            if error.is::<MissingContent>() {
                SuggestionError::Malformed(error.to_string())
            } else {
                SuggestionError::Request(format!("{error:#}"))
            }
        })?;

        let names = parse_suggestion_list(&content)?;
        debug!(
            event_name = "agent.suggestions.parsed",
            context = %context_name,
            names = names.len(),
            "suggestion reply parsed"
        );
        Ok(names)
    }
}

/// Stand-in when no suggestion service is configured; every request fails so
/// callers fall back to the featured sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledSuggestions;

#[async_trait]
impl SuggestionProvider for DisabledSuggestions {
    async fn suggest(
        &self,
        _context_name: &str,
        _count: usize,
    ) -> Result<Vec<String>, SuggestionError> {
        Err(SuggestionError::Request("suggestion service is disabled".to_string()))
    }
}

pub fn provider_from_config(config: &SuggestionsConfig) -> Result<Arc<dyn SuggestionProvider>> {
    let provider: Arc<dyn SuggestionProvider> = match config.provider {
        SuggestionProviderKind::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| anyhow!("suggestions.api_key is required for openai"))?;
            let client = OpenAiChatClient::new(
                api_key,
                config.model.clone(),
                config.base_url.as_deref(),
                config.timeout(),
            )?;
            Arc::new(LlmSuggestionProvider::new(client))
        }
        SuggestionProviderKind::Ollama => {
            let base_url = config
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow!("suggestions.base_url is required for ollama"))?;
            let client = OllamaChatClient::new(base_url, config.model.clone(), config.timeout())?;
            Arc::new(LlmSuggestionProvider::new(client))
        }
        SuggestionProviderKind::Disabled => Arc::new(DisabledSuggestions),
    };

    info!(
        event_name = "agent.suggestions.configured",
        provider = config.provider.as_str(),
        model = %config.model,
        "suggestion provider configured"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use aislefinder_core::config::{AppConfig, SuggestionProviderKind};
    use aislefinder_core::recommendations::{SuggestionError, SuggestionProvider};

    use super::{provider_from_config, DisabledSuggestions, LlmSuggestionProvider};
    use crate::llm::{LlmClient, MissingContent};

    enum Reply {
        Text(&'static str),
        Missing,
        Down,
    }

    struct CannedClient {
        reply: Reply,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn new(reply: Reply) -> Self {
            Self { reply, prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().expect("prompts lock").push(prompt.to_string());
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Missing => Err(MissingContent.into()),
                Reply::Down => Err(anyhow!("connection refused")),
            }
        }
    }

    #[tokio::test]
    async fn reply_array_becomes_names() {
        let provider = LlmSuggestionProvider::new(CannedClient::new(Reply::Text(
            "[\"Milk\", \"Butter\", \"Jam\"]",
        )));

        let names = provider.suggest("Bread", 3).await.expect("names");

        assert_eq!(names, vec!["Milk", "Butter", "Jam"]);
        let prompts = provider.client.prompts.lock().expect("prompts lock").clone();
        assert!(prompts[0].starts_with("Suggest 3 products to buy with Bread."));
    }

    #[tokio::test]
    async fn prose_reply_is_malformed() {
        let provider =
            LlmSuggestionProvider::new(CannedClient::new(Reply::Text("Milk goes well.")));

        let outcome = provider.suggest("Bread", 3).await;

        assert!(matches!(outcome, Err(SuggestionError::Malformed(_))));
    }

    #[tokio::test]
    async fn missing_content_is_malformed_and_transport_failure_is_request() {
        let missing = LlmSuggestionProvider::new(CannedClient::new(Reply::Missing));
        let down = LlmSuggestionProvider::new(CannedClient::new(Reply::Down));

        assert!(matches!(missing.suggest("Bread", 3).await, Err(SuggestionError::Malformed(_))));
        assert!(matches!(
            down.suggest("Bread", 3).await,
            Err(SuggestionError::Request(ref msg)) if msg.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn disabled_provider_always_fails_as_request() {
        let outcome = DisabledSuggestions.suggest("Bread", 3).await;
        assert!(matches!(outcome, Err(SuggestionError::Request(_))));
    }

    #[test]
    fn default_config_builds_disabled_provider() {
        let config = AppConfig::default();
        assert_eq!(config.suggestions.provider, SuggestionProviderKind::Disabled);
        assert!(provider_from_config(&config.suggestions).is_ok());
    }

    #[test]
    fn openai_without_key_is_rejected() {
        let mut config = AppConfig::default();
        config.suggestions.provider = SuggestionProviderKind::OpenAi;

        let outcome = provider_from_config(&config.suggestions);

        assert!(outcome.is_err());
    }
}
