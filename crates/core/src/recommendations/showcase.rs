use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::{RecommendationCandidate, RecommendationSet};
use crate::catalog::Catalog;
use crate::domain::product::Product;

/// The product strip shown on the search screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Showcase {
    Recommended { context: String, items: Vec<RecommendationCandidate> },
    Featured { items: Vec<Product> },
}

impl Showcase {
    pub fn headline(&self) -> String {
        match self {
            Self::Recommended { context, .. } => {
                format!("Frequently Bought Together with {context}")
            }
            Self::Featured { .. } => "Explore These Popular Products".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Recommended { items, .. } => items.len(),
            Self::Featured { items } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validated recommendations when there are any, otherwise a random sample of
/// `fallback_size` catalog products that have images.
pub fn showcase<R>(
    set: &RecommendationSet,
    catalog: &Catalog,
    fallback_size: usize,
    rng: &mut R,
) -> Showcase
where
    R: Rng + ?Sized,
{
    match &set.context {
        Some(context) if !set.candidates.is_empty() => {
            Showcase::Recommended { context: context.clone(), items: set.candidates.clone() }
        }
        _ => Showcase::Featured { items: catalog.sample_with_images(fallback_size, rng) },
    }
}
