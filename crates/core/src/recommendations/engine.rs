use tracing::{debug, warn};

use super::types::{RecommendationCandidate, SuggestionError, SuggestionProvider};
use super::DEFAULT_MAX_SUGGESTIONS;
use crate::catalog::Catalog;
use crate::domain::cart::CartEntry;

pub struct RecommendationEngine<P> {
    provider: P,
    max_suggestions: usize,
}

impl<P> RecommendationEngine<P>
where
    P: SuggestionProvider,
{
    pub fn new(provider: P) -> Self {
        Self { provider, max_suggestions: DEFAULT_MAX_SUGGESTIONS }
    }

    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Recommends catalog products to buy alongside `last_item`.
    ///
    /// Returns an empty list without calling the provider when nothing was
    /// added or the item's name cannot be determined. Provider failures are
    /// logged and also yield an empty list.
    pub async fn recommend(
        &self,
        last_item: Option<&CartEntry>,
        catalog: &Catalog,
    ) -> Vec<RecommendationCandidate> {
        let Some(context_name) = last_item.and_then(|entry| context_name(entry, catalog)) else {
            debug!(
                event_name = "core.recommendation.skipped",
                "no recently added item with a name; skipping suggestion request"
            );
            return Vec::new();
        };

        match self.provider.suggest(&context_name, self.max_suggestions).await {
            Ok(names) => {
                let candidates = validate_candidates(&names, catalog, self.max_suggestions);
                debug!(
                    event_name = "core.recommendation.validated",
                    context = %context_name,
                    suggested = names.len(),
                    validated = candidates.len(),
                    "suggestions validated against catalog"
                );
                candidates
            }
            Err(SuggestionError::Malformed(detail)) => {
                warn!(
                    event_name = "core.recommendation.malformed",
                    context = %context_name,
                    detail = %detail,
                    "suggestion service returned a malformed response"
                );
                Vec::new()
            }
            Err(error) => {
                warn!(
                    event_name = "core.recommendation.failed",
                    context = %context_name,
                    error = %error,
                    "suggestion request failed"
                );
                Vec::new()
            }
        }
    }
}

fn context_name(entry: &CartEntry, catalog: &Catalog) -> Option<String> {
    entry
        .name()
        .map(str::to_string)
        .or_else(|| catalog.find(entry.id()).map(|product| product.name.clone()))
}

/// Keeps suggested names that occur (case-insensitively) inside a catalog
/// product name, bound to the first such product, up to `limit`.
pub fn validate_candidates(
    names: &[String],
    catalog: &Catalog,
    limit: usize,
) -> Vec<RecommendationCandidate> {
    names
        .iter()
        .filter_map(|name| {
            catalog.first_name_match(name).map(|product| RecommendationCandidate {
                name: name.trim().to_string(),
                product_id: product.id.clone(),
                matched_name: product.name.clone(),
                is_recommended: true,
            })
        })
        .take(limit)
        .collect()
}
