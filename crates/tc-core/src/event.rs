//! Per-event object collections: reconstructed jets and generator truth.

use serde::{Deserialize, Deserializer, Serialize};

use crate::kinematics::FourMomentum;

/// A reconstructed jet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    /// Transverse momentum (GeV).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Jet mass (GeV).
    #[serde(default)]
    pub mass: f64,
    /// b-tag flag.
    #[serde(default)]
    pub btag: bool,
}

impl Jet {
    /// Four-momentum derived from the jet kinematics.
    pub fn p4(&self) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.mass)
    }
}

/// A generator-level truth particle.
///
/// Truth records form an array-backed forest: `mother` indexes into the same
/// event's particle collection, `None` meaning no recorded parent. Generator
/// output can carry malformed links (out-of-range, self-referential), so all
/// mother resolution is bounds-checked at the point of use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenParticle {
    /// PDG particle identifier (signed).
    pub pid: i32,
    /// Transverse momentum (GeV).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Particle mass (GeV).
    #[serde(default)]
    pub mass: f64,
    /// Index of the mother particle within the event's truth collection.
    ///
    /// Event generators write `-1` for parentless records; the deserializer
    /// maps any negative index to `None`.
    #[serde(default, deserialize_with = "mother_index")]
    pub mother: Option<usize>,
}

impl GenParticle {
    /// Four-momentum derived from the particle kinematics.
    pub fn p4(&self) -> FourMomentum {
        FourMomentum::from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.mass)
    }
}

fn mother_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|idx| usize::try_from(idx).ok()))
}

/// One simulated collision event: reconstructed jets plus truth particles.
///
/// Read-only once produced by the event source; the reconstruction passes
/// never mutate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Reconstructed jets.
    #[serde(default)]
    pub jets: Vec<Jet>,
    /// Generator-level truth particles.
    #[serde(default)]
    pub particles: Vec<GenParticle>,
}
