use aislefinder_agent::provider_from_config;
use aislefinder_core::scan::NOT_FOUND_MESSAGE;
use aislefinder_core::{
    load_catalog, recommendations::showcase, CartEntry, ProductId, RecommendationEngine,
    RecommendationSet,
};
use aislefinder_db::SqlCatalogRepository;

use crate::commands::{execute, open_store, CommandResult, EXIT_NOT_FOUND, EXIT_SUGGESTION};

/// What to show next to a cart whose last addition is `id`.
pub fn run(id: String) -> CommandResult {
    execute("recommend", |config| async move {
        let provider = provider_from_config(&config.suggestions)
            .map_err(|error| ("suggestion_config", format!("{error:#}"), EXIT_SUGGESTION))?;

        let pool = open_store(&config).await?;
        let catalog = load_catalog(&SqlCatalogRepository::new(pool.clone())).await;
        pool.close().await;

        let id = ProductId::new(id.trim());
        let Some(context) = catalog.find(&id).map(|product| product.name.clone()) else {
            return Err(("not_found", NOT_FOUND_MESSAGE.to_string(), EXIT_NOT_FOUND));
        };

        let engine = RecommendationEngine::new(provider)
            .with_max_suggestions(config.suggestions.max_suggestions);
        let candidates = engine.recommend(Some(&CartEntry::ById(id)), &catalog).await;
        let set = RecommendationSet { context: Some(context), candidates, generation: 1 };

        let shown = showcase(
            &set,
            &catalog,
            config.suggestions.fallback_sample_size,
            &mut rand::thread_rng(),
        );
        Ok(CommandResult::success_with_data("recommend", shown.headline(), &shown))
    })
}
