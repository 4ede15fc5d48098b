mod resolver;

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::cart::CartEntry;

pub use resolver::{resolve, Resolution, ResolutionSource, ResolvedCartItem};

pub type CartHandle = Arc<CartStore>;

/// Session-scoped, insertion-ordered cart. Append-only: there is no removal
/// and no quantity merge, so duplicates show up verbatim in totals.
#[derive(Debug, Default)]
pub struct CartStore {
    entries: RwLock<Vec<CartEntry>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> CartHandle {
        Arc::new(Self::new())
    }

    /// Appends the entry and returns the new cart length.
    pub fn add(&self, entry: impl Into<CartEntry>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push(entry.into());
        entries.len()
    }

    pub fn list(&self) -> Vec<CartEntry> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<CartEntry> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
