pub mod harvest;
pub mod meta;
pub mod purl;

// Re-export common types for convenience
pub use harvest::{HarvestError, HarvesterAdapter, MetadataProvider, RawMetadata};
pub use meta::{
    apply_without_notify, Attribute, Field, FieldValue, InMemoryStore, MetaError, MetaRegistry,
    MetaService, Package, PackageListener, PackageModifier, PackageStore, PackageTask,
    QueuedTaskRunner, Trust,
};
pub use purl::{PackageId, PurlError};

/// Installs a `tracing` subscriber honoring `RUST_LOG`, for binaries and
/// tests embedding the engine. Safe to call more than once.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
