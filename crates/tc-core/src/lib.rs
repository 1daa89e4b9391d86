//! # tc-core
//!
//! Shared kinematics and event model for TopCal.
//!
//! Holds the particle-level types consumed by the reconstruction passes in
//! `tc-reco`: four-momenta, reconstructed jets, generator-level truth
//! particles with arena-style mother links, and the per-event container.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod kinematics;

pub use error::{Error, Result};
pub use event::{Event, GenParticle, Jet};
pub use kinematics::{delta_r, wrap_delta_phi, FourMomentum};
