//! Metadata consolidation engine.
//!
//! Consolidates package-metadata fields independently reported by several
//! untrusted sources into one authoritative record per package:
//! - **Field state**: [`FieldValue`] value/trust/contest/error/override
//!   state machine, bound to a [`Field`] by an [`Attribute`]
//! - **Aggregate**: [`Package`] owning the full attribute set, mutated only
//!   through a scoped [`PackageModifier`]
//! - **Orchestration**: [`MetaRegistry`] edit transactions with listener
//!   fan-out, [`QueuedTaskRunner`] for deferred follow-up work
//! - **Facade**: [`MetaService`] name-keyed read/write entry points

pub mod attribute;
pub mod field;
pub mod package;
pub mod registry;
pub mod runner;
pub mod service;
pub mod store;
pub mod value;

pub use attribute::Attribute;
pub use field::{Field, Trust};
pub use package::{Package, PackageModifier};
pub use registry::{apply_without_notify, MetaRegistry, PackageListener, PackageTask};
pub use runner::QueuedTaskRunner;
pub use service::MetaService;
pub use store::{InMemoryStore, PackageHandle, PackageStore};
pub use value::FieldValue;

use crate::harvest::HarvestError;
use crate::purl::{PackageId, PurlError};
use thiserror::Error;

/// Errors surfaced by the consolidation engine.
///
/// Trust conflicts are deliberately absent: a disagreeing proposal is not an
/// error but the `contesting` state of the field, kept for manual resolution.
#[derive(Error, Debug)]
pub enum MetaError {
    /// Strict lookup of a package that was never referenced
    #[error("unknown package '{0}'")]
    UnknownPackage(PackageId),

    /// A wire field name that is not part of the closed field set
    #[error("unknown metadata field '{0}'")]
    UnknownField(String),

    /// Malformed package coordinate
    #[error(transparent)]
    Purl(#[from] PurlError),

    /// Failure reported by a harvester task
    #[error(transparent)]
    Harvest(#[from] HarvestError),
}
