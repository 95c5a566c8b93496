//! The closed set of tracked metadata dimensions and the trust scale used to
//! arbitrate between competing proposals for the same dimension.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One metadata dimension tracked per package.
///
/// The set is closed: adding a dimension means extending this enumeration.
/// There are no dynamic fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Description,
    /// Parties credited for the package (authors, attribution notices)
    Attribution,
    HomePage,
    DownloadLocation,
    SourceLocation,
    DeclaredLicense,
    DetectedLicenses,
    Sha1,
    Sha256,
}

impl Field {
    /// Every field, in a stable order. New packages get one attribute per
    /// entry here.
    pub const ALL: [Field; 10] = [
        Field::Title,
        Field::Description,
        Field::Attribution,
        Field::HomePage,
        Field::DownloadLocation,
        Field::SourceLocation,
        Field::DeclaredLicense,
        Field::DetectedLicenses,
        Field::Sha1,
        Field::Sha256,
    ];

    /// Stable wire name, used by the presentation boundary.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Attribution => "attribution",
            Field::HomePage => "home_page",
            Field::DownloadLocation => "download_location",
            Field::SourceLocation => "source_location",
            Field::DeclaredLicense => "declared_license",
            Field::DetectedLicenses => "detected_licenses",
            Field::Sha1 => "sha1",
            Field::Sha256 => "sha256",
        }
    }

    /// Looks a field up by its wire name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Field> {
        let lower = name.to_ascii_lowercase();
        Field::ALL.into_iter().find(|f| f.name() == lower)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordinal confidence rank of a proposed field value.
///
/// Higher ranks win; [`Trust::MAX`] is reserved for manual corrections and
/// carries override semantics (see `Attribute::update`). The rank only
/// arbitrates between competing proposals for the *same* field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Trust(u8);

impl Trust {
    /// No confidence; the rank of an empty field.
    pub const NONE: Trust = Trust(0);
    /// Heuristic or derived data.
    pub const GUESS: Trust = Trust(25);
    /// Reported by a secondary source.
    pub const LIKELY: Trust = Trust(50);
    /// Reported by the authoritative upstream.
    pub const PROBABLY: Trust = Trust(75);
    /// Manual correction; freezes the field against automated writes.
    pub const MAX: Trust = Trust(100);

    /// Builds a rank from a raw score, clamped to the `0..=100` scale.
    pub fn score(score: u8) -> Trust {
        Trust(score.min(100))
    }

    /// Raw score on the `0..=100` scale.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Trust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
