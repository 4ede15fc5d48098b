use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::ProductId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SuggestionError {
    #[error("suggestion request failed: {0}")]
    Request(String),
    #[error("malformed suggestion response: {0}")]
    Malformed(String),
}

/// External free-text suggestion capability.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Returns up to `count` short product names related to `context_name`.
    async fn suggest(
        &self,
        context_name: &str,
        count: usize,
    ) -> Result<Vec<String>, SuggestionError>;
}

#[async_trait]
impl<T> SuggestionProvider for Arc<T>
where
    T: SuggestionProvider + ?Sized,
{
    async fn suggest(
        &self,
        context_name: &str,
        count: usize,
    ) -> Result<Vec<String>, SuggestionError> {
        (**self).suggest(context_name, count).await
    }
}

/// A suggested name that matched at least one catalog product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    /// The name as the suggestion service returned it.
    pub name: String,
    pub product_id: ProductId,
    pub matched_name: String,
    pub is_recommended: bool,
}

/// Latest published output of a debounced recommendation run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub context: Option<String>,
    pub candidates: Vec<RecommendationCandidate>,
    /// Incremented on every completed run.
    pub generation: u64,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
