//! Catalog-validated product recommendations.
//!
//! Candidate names come from an external free-text suggestion service keyed on
//! the most recently added cart item. Each name is kept only if some catalog
//! product contains it (case-insensitive); failures of the service degrade to
//! an empty list. [`RecommendationDebouncer`] coalesces bursts of cart changes
//! into a single service call.

mod debounce;
mod engine;
mod parse;
mod showcase;
mod types;

use std::time::Duration;

pub use debounce::RecommendationDebouncer;
pub use engine::{validate_candidates, RecommendationEngine};
pub use parse::parse_suggestion_list;
pub use showcase::{showcase, Showcase};
pub use types::{RecommendationCandidate, RecommendationSet, SuggestionError, SuggestionProvider};

/// Names requested from the suggestion service per call.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 10;

/// Products shown when no recommendation survives validation.
pub const DEFAULT_FALLBACK_SAMPLE_SIZE: usize = 4;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
