use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::engine::RecommendationEngine;
use super::types::{RecommendationSet, SuggestionProvider};
use crate::catalog::Catalog;
use crate::domain::cart::CartEntry;

/// Coalesces bursts of cart changes into one recommendation run.
///
/// Each [`trigger`](Self::trigger) aborts the pending run and schedules a new
/// one after `delay`. Dropping the debouncer aborts whatever is pending, so a
/// torn-down consumer never receives a stale result. Must be used from inside
/// a tokio runtime.
pub struct RecommendationDebouncer<P> {
    engine: Arc<RecommendationEngine<P>>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    results: Arc<watch::Sender<RecommendationSet>>,
}

impl<P> RecommendationDebouncer<P>
where
    P: SuggestionProvider + 'static,
{
    pub fn new(engine: Arc<RecommendationEngine<P>>, delay: Duration) -> Self {
        let (results, _) = watch::channel(RecommendationSet::default());
        Self { engine, delay, pending: None, results: Arc::new(results) }
    }

    pub fn subscribe(&self) -> watch::Receiver<RecommendationSet> {
        self.results.subscribe()
    }

    pub fn latest(&self) -> RecommendationSet {
        self.results.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn trigger(&mut self, last_item: CartEntry, catalog: Arc<Catalog>) {
        if self.cancel() {
            debug!(
                event_name = "core.recommendation.debounce_restarted",
                "pending recommendation run replaced by a newer cart change"
            );
        }

        let engine = Arc::clone(&self.engine);
        let results = Arc::clone(&self.results);
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let candidates = engine.recommend(Some(&last_item), &catalog).await;
            let context = last_item
                .name()
                .map(str::to_string)
                .or_else(|| catalog.find(last_item.id()).map(|product| product.name.clone()));

            results.send_modify(|set| {
                set.context = context;
                set.candidates = candidates;
                set.generation += 1;
            });
        }));
    }

    /// Aborts the pending run. Returns whether one was still in flight.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

impl<P> Drop for RecommendationDebouncer<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
