//! # Bulk Import Pipeline
//!
//! Spreadsheet-driven ingestion of catalog records, executed out-of-band
//! from the triggering request. A submission allocates an [`ImportJob`] in
//! the in-memory [`ImportRegistry`] and detaches an [`ImportRunner`] task;
//! clients observe progress solely by polling the job snapshot.
//!
//! Rows are processed batch-at-a-time with intra-batch concurrency; a single
//! row's failure is recorded on the job and never aborts the run.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod engine;
pub mod job;
pub mod registry;
pub mod sheet;

pub use engine::ImportRunner;
pub use job::{ImportJob, ImportSnapshot, ImportStatus, RowError};
pub use registry::ImportRegistry;

/// The three import variants. All share one scheduling pattern and differ
/// only in the per-row upsert decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Import per-location quantities for items already registered in the
    /// catalog; unknown codes are row errors.
    Quantities,
    /// Register new catalog items; codes already present (in the catalog or
    /// earlier in the same file) are ignored.
    Items,
    /// Sparse field updates for registered items; only non-blank columns
    /// are applied.
    Details,
}

impl ImportMode {
    /// Parse the URL slug used by the submit endpoint.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "quantities" => Some(Self::Quantities),
            "items" => Some(Self::Items),
            "details" => Some(Self::Details),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quantities => "quantities",
            Self::Items => "items",
            Self::Details => "details",
        }
    }
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
