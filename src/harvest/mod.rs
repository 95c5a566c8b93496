//! Harvest boundary - provider capability and listener dispatch.
//!
//! This module holds the seam between the consolidation engine and the
//! external metadata sources:
//! - **Capability**: [`MetadataProvider`] (type predicate + fetch) implemented
//!   once per upstream source
//! - **Report**: normalized field proposals via [`RawMetadata`]
//! - **Dispatch**: [`HarvesterAdapter`] turns a provider into a
//!   [`PackageListener`](crate::meta::PackageListener)
//! - **Errors**: [`HarvestError`] for provider failures

pub mod adapter;
pub mod traits;

// Re-export commonly used types
pub use adapter::HarvesterAdapter;
pub use traits::{HarvestError, MetadataProvider, RawMetadata};
