//! Provider capability and the normalized metadata it reports.

use crate::meta::field::{Field, Trust};
use crate::purl::PackageId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Capability implemented by one upstream metadata source.
///
/// Translates a package coordinate into raw field proposals. The engine only
/// invokes [`fetch`](Self::fetch) from inside a queued task, never
/// synchronously from the notify path, so implementations are free to block
/// on network I/O.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one provider instance serves all
/// packages concurrently.
pub trait MetadataProvider: Send + Sync {
    /// Identifier used in logging and error reporting, e.g. `"clearlydefined"`.
    fn name(&self) -> &str;

    /// Whether this provider can harvest the given package type
    /// (e.g. `"deb"`, `"npm"`).
    fn supports(&self, package_type: &str) -> bool;

    /// Fetches upstream metadata for one package.
    ///
    /// `Ok(None)` means the upstream knows nothing about the package; that is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when the upstream is unreachable or responds
    /// with something unusable.
    fn fetch(&self, purl: &PackageId) -> Result<Option<RawMetadata>, HarvestError>;
}

/// Normalized field proposals reported by one provider for one package.
///
/// All fields are optional; a provider reports what it knows. The attached
/// [`Trust`] rank applies to every reported field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMetadata {
    /// Confidence rank of this provider's data
    pub trust: Trust,

    pub title: Option<String>,
    pub description: Option<String>,

    /// Parties credited for the package
    pub authors: Option<Vec<String>>,

    pub homepage: Option<String>,
    pub download_location: Option<String>,
    pub source_location: Option<String>,

    /// License as declared by the package itself
    pub declared_license: Option<String>,

    /// License expressions found by scanning the sources
    pub detected_licenses: Option<Vec<String>>,

    pub sha1: Option<String>,
    pub sha256: Option<String>,
}

impl RawMetadata {
    /// Creates an empty report at the given trust rank.
    pub fn new(trust: Trust) -> Self {
        Self {
            trust,
            title: None,
            description: None,
            authors: None,
            homepage: None,
            download_location: None,
            source_location: None,
            declared_license: None,
            detected_licenses: None,
            sha1: None,
            sha256: None,
        }
    }

    /// The reported fields as `(Field, Value)` proposals, absent ones
    /// skipped.
    pub fn field_values(&self) -> Vec<(Field, Value)> {
        let mut values = Vec::new();
        {
            let mut push_str = |field: Field, text: &Option<String>| {
                if let Some(text) = text {
                    values.push((field, json!(text)));
                }
            };
            push_str(Field::Title, &self.title);
            push_str(Field::Description, &self.description);
            push_str(Field::HomePage, &self.homepage);
            push_str(Field::DownloadLocation, &self.download_location);
            push_str(Field::SourceLocation, &self.source_location);
            push_str(Field::DeclaredLicense, &self.declared_license);
            push_str(Field::Sha1, &self.sha1);
            push_str(Field::Sha256, &self.sha256);
        }
        if let Some(authors) = &self.authors {
            values.push((Field::Attribution, json!(authors)));
        }
        if let Some(licenses) = &self.detected_licenses {
            values.push((Field::DetectedLicenses, json!(licenses)));
        }
        values.sort_by_key(|(field, _)| *field);
        values
    }

    /// Whether the provider reported anything at all.
    pub fn is_empty(&self) -> bool {
        self.field_values().is_empty()
    }
}

/// Errors that can occur while harvesting from one provider.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Upstream is unreachable (network or provider outage); the task is
    /// marked failed and may be re-attempted by a later change event
    #[error("provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Upstream answered with something unusable; not retryable
    #[error("malformed response from provider '{provider}': {reason}")]
    MalformedResponse { provider: String, reason: String },

    /// Provider call exceeded the allowed time
    #[error("provider '{provider}' timed out after {timeout_secs}s")]
    Timeout { provider: String, timeout_secs: u64 },
}
