//! Four-momenta and angular distances in η–φ space.

use std::f64::consts::PI;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// A Lorentz four-momentum in Cartesian components (GeV).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FourMomentum {
    /// x momentum component.
    pub px: f64,
    /// y momentum component.
    pub py: f64,
    /// z momentum component.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl FourMomentum {
    /// Build from collider coordinates: transverse momentum, pseudorapidity,
    /// azimuthal angle and rest mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        let e = (p2 + m * m).sqrt();
        Self { px, py, pz, e }
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Azimuthal angle in (−π, π].
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    /// Pseudorapidity. Not meaningful for purely longitudinal momenta.
    pub fn eta(&self) -> f64 {
        (self.pz / self.pt()).asinh()
    }

    /// Invariant mass, √max(0, E² − |p|²).
    ///
    /// The max-0 guard absorbs floating-point cancellation for massless
    /// constituents, which would otherwise produce NaN.
    pub fn mass(&self) -> f64 {
        let p2 = self.px * self.px + self.py * self.py + self.pz * self.pz;
        (self.e * self.e - p2).max(0.0).sqrt()
    }
}

impl Add for FourMomentum {
    type Output = FourMomentum;

    fn add(self, rhs: FourMomentum) -> FourMomentum {
        FourMomentum {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: FourMomentum) {
        *self = *self + rhs;
    }
}

impl Sum for FourMomentum {
    fn sum<I: Iterator<Item = FourMomentum>>(iter: I) -> FourMomentum {
        iter.fold(FourMomentum::default(), Add::add)
    }
}

/// Wrap an azimuthal difference into (−π, π].
pub fn wrap_delta_phi(dphi: f64) -> f64 {
    let mut d = dphi % (2.0 * PI);
    if d > PI {
        d -= 2.0 * PI;
    } else if d <= -PI {
        d += 2.0 * PI;
    }
    d
}

/// Angular separation ΔR = √(Δη² + Δφ²) with Δφ wrapped into (−π, π].
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let deta = eta1 - eta2;
    let dphi = wrap_delta_phi(phi1 - phi2);
    deta.hypot(dphi)
}
