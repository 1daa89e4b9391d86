//! Numbers-first JSON artifact with the reduced analysis output.

use serde::Serialize;

use crate::binned::BinnedSummary;

/// Schema identifier written into every artifact.
pub const ARTIFACT_SCHEMA_VERSION: &str = "topcal/artifact/v1";

/// End-of-run artifact: response curves and mass spectra, reduced to flat
/// per-bin arrays that plotting code can consume directly.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisArtifact {
    /// Artifact schema identifier.
    pub schema_version: String,
    /// Provenance metadata.
    pub meta: ArtifactMeta,
    /// One reduced summary per observable channel.
    pub channels: Vec<ChannelSummary>,
}

/// Provenance metadata for an [`AnalysisArtifact`].
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMeta {
    /// Producing tool.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Number of processed events.
    pub n_events: u64,
}

impl ArtifactMeta {
    /// Metadata stamped with this crate's version.
    pub fn new(n_events: u64) -> Self {
        Self {
            tool: "topcal".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            n_events,
        }
    }
}

/// Reduced output of one observable channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelSummary {
    /// Channel name (see [`crate::reconstruct::Channel::name`]).
    pub name: String,
    /// Binning variable (see [`crate::reconstruct::Channel::binned_by`]).
    pub binned_by: String,
    /// The reduced per-bin arrays.
    pub summary: BinnedSummary,
}
