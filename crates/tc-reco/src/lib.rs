//! # tc-reco
//!
//! Hadronic top-quark reconstruction and jet-response calibration.
//!
//! Per event, three passes run over the jet and truth collections: a
//! resolution pass matching b-tagged jets to truth b quarks, a dijet-mass
//! pass over b-tagged pairs, and a combinatorial top-candidate search over
//! one tagged anchor plus an untagged pair inside the W mass window. The
//! emitted observables stream into per-channel binned accumulators that
//! reduce to response curves and mass spectra with per-bin uncertainties.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod ancestry;
pub mod artifact;
pub mod binned;
pub mod config;
pub mod matcher;
pub mod pairs;
pub mod reconstruct;

pub use analysis::{run, run_parallel, Analysis};
pub use ancestry::is_consistent_top_decay;
pub use artifact::{AnalysisArtifact, ArtifactMeta, ChannelSummary, ARTIFACT_SCHEMA_VERSION};
pub use binned::{BinnedAccumulator, BinnedSummary, Binning};
pub use config::AnalysisConfig;
pub use matcher::{nearest_match, PidSelector};
pub use pairs::{anchored_pairs, pairs, triples};
pub use reconstruct::{Channel, EventReconstructor, Observable};
