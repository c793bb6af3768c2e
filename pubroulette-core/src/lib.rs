//! Core types and service wiring for the pubroulette venue picker.

/// Conversion of raw candidate records into venues.
pub mod builder;
/// Tunables for selection.
pub mod config;
/// Route-ordered multi-venue selection built on top of the roulette service.
pub mod crawl;
/// Ordered chain of secondary enrichment sources.
pub mod enrichment;
/// Process-local exclusion store.
pub mod exclusion;
/// Domain models, identifiers and validated query types.
pub mod model;
/// Traits describing the external collaborators.
pub mod ports;
/// Random venue selection with bounded retry.
pub mod service;
/// Whitelist mapping of raw attributes to feature labels.
pub mod tags;

#[cfg(test)]
mod mocks;

pub use builder::*;
pub use config::*;
pub use crawl::*;
pub use enrichment::*;
pub use exclusion::*;
pub use model::*;
pub use ports::*;
pub use service::*;
pub use tags::*;
