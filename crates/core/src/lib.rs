pub mod cart;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod recommendations;
pub mod scan;

pub use cart::{resolve, CartHandle, CartStore, Resolution, ResolutionSource, ResolvedCartItem};
pub use catalog::{load_catalog, Catalog, CatalogAccessor, CatalogError, ProductLocation};
pub use domain::cart::{CartEntry, PartialProduct};
pub use domain::product::{Product, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{FixedRateSummarizer, OrderSummary, PricingSummarizer};
pub use recommendations::{
    RecommendationCandidate, RecommendationDebouncer, RecommendationEngine, RecommendationSet,
    Showcase, SuggestionError, SuggestionProvider,
};
pub use scan::{lookup_scanned, verify_scan, ScanVerification, VerificationError};
