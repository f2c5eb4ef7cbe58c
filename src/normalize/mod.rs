//! Reshaping of upstream responses into the gateway's own schema.
//!
//! Each normalizer owns the query it sends upstream together with the projection applied to
//! the answer, so the filtering that is delegated to the server lives next to the code that
//! relies on it.

pub mod catalog;
pub mod feed;
pub mod pages;

pub use catalog::{CatalogNormalizer, FixedRating, MangaSummary, RandomRating, RatingSource};
pub use feed::ChapterSummary;
pub use pages::PageQuality;
