use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::ProductLookup;
use crate::domain::cart::CartEntry;
use crate::domain::product::{Product, ProductId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The entry already carried a name and a price.
    Inline,
    Catalog,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCartItem {
    #[serde(flatten)]
    pub product: Product,
    pub source: ResolutionSource,
}

/// Surviving items in cart order plus the ids that could not be resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub items: Vec<ResolvedCartItem>,
    pub dropped: Vec<ProductId>,
}

impl Resolution {
    pub fn is_lossless(&self) -> bool {
        self.dropped.is_empty()
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.items.iter().map(|item| &item.product)
    }
}

/// Turns possibly-partial cart entries into full items.
///
/// Inline entries never touch `catalog`. Every other entry costs one indexed
/// lookup; entries without a match, or carrying a negative price, are dropped
/// and reported in [`Resolution::dropped`].
pub fn resolve<L>(entries: &[CartEntry], catalog: &L) -> Resolution
where
    L: ProductLookup + ?Sized,
{
    let mut resolution =
        Resolution { items: Vec::with_capacity(entries.len()), dropped: Vec::new() };

    for entry in entries {
        if let Err(error) = entry.validate() {
            warn!(
                event_name = "core.cart.invalid_entry",
                product_id = %entry.id(),
                error = %error,
                "cart entry rejected during resolution"
            );
            resolution.dropped.push(entry.id().clone());
            continue;
        }

        if let Some(product) = entry.inline_product() {
            resolution.items.push(ResolvedCartItem { product, source: ResolutionSource::Inline });
            continue;
        }

        let Some(base) = catalog.lookup(entry.id()) else {
            resolution.dropped.push(entry.id().clone());
            continue;
        };

        let product = match entry {
            CartEntry::Partial(partial) => partial.merge_onto(base),
            CartEntry::ById(_) | CartEntry::Full(_) => base.clone(),
        };
        resolution.items.push(ResolvedCartItem { product, source: ResolutionSource::Catalog });
    }

    if !resolution.dropped.is_empty() {
        debug!(
            event_name = "core.cart.unresolved_entries",
            dropped = resolution.dropped.len(),
            "cart entries without a catalog match were dropped"
        );
    }

    resolution
}
