//! Analysis configuration: matching thresholds, mass windows and binnings.

use std::path::Path;

use serde::Deserialize;

use tc_core::{Error, Result};

use crate::binned::Binning;

/// Thresholds and binnings for the reconstruction passes.
///
/// The defaults reproduce the reference analysis: ΔR matching at 0.3, a
/// 40 GeV anchor-jet cut, a [40, 120] GeV W-candidate mass window, response
/// curves in 10 pT bins over [20, 120] and 5 |η| bins over [0, 2.5], and
/// the dijet/three-jet mass spectra binnings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Maximal ΔR for jet–truth matching (exclusive).
    pub delta_r_max: f64,
    /// Minimal anchor b-jet pT in the top-candidate pass (GeV, exclusive).
    pub anchor_pt_min: f64,
    /// Inclusive dijet-mass window selecting W candidates (GeV).
    pub w_mass_window: (f64, f64),
    /// Response-curve binning in jet pT.
    pub pt_binning: Binning,
    /// Response-curve binning in |η|.
    pub eta_binning: Binning,
    /// Dijet-mass spectrum binning.
    pub dijet_mass_binning: Binning,
    /// Three-jet-mass spectrum binning.
    pub triplet_mass_binning: Binning,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            delta_r_max: 0.3,
            anchor_pt_min: 40.0,
            w_mass_window: (40.0, 120.0),
            pt_binning: Binning::uniform(10, 20.0, 120.0),
            eta_binning: Binning::uniform(5, 0.0, 2.5),
            dijet_mass_binning: Binning::uniform(80, 40.0, 200.0),
            triplet_mass_binning: Binning::uniform(140, 50.0, 330.0),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file. Missing fields fall back to the defaults;
    /// the result is validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Check thresholds and binnings.
    pub fn validate(&self) -> Result<()> {
        if !self.delta_r_max.is_finite() || self.delta_r_max <= 0.0 {
            return Err(Error::Validation(format!(
                "delta_r_max must be finite and positive, got {}",
                self.delta_r_max
            )));
        }
        if !self.anchor_pt_min.is_finite() || self.anchor_pt_min < 0.0 {
            return Err(Error::Validation(format!(
                "anchor_pt_min must be finite and non-negative, got {}",
                self.anchor_pt_min
            )));
        }
        let (lo, hi) = self.w_mass_window;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(Error::Validation(format!(
                "w_mass_window must be an ordered finite interval, got ({lo}, {hi})"
            )));
        }
        self.pt_binning.validate()?;
        self.eta_binning.validate()?;
        self.dijet_mass_binning.validate()?;
        self.triplet_mass_binning.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pt_binning.n_bins(), 10);
        assert_eq!(config.eta_binning.n_bins(), 5);
        assert_eq!(config.dijet_mass_binning.n_bins(), 80);
        assert_eq!(config.triplet_mass_binning.n_bins(), 140);
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"delta_r_max": 0.4, "pt_binning": [20.0, 60.0, 120.0]}"#)
                .unwrap();
        assert_eq!(config.delta_r_max, 0.4);
        assert_eq!(config.pt_binning.n_bins(), 2);
        assert_eq!(config.anchor_pt_min, 40.0);
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed: std::result::Result<AnalysisConfig, _> =
            serde_json::from_str(r#"{"delta_r": 0.4}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_bad_window() {
        let mut config = AnalysisConfig::default();
        config.w_mass_window = (120.0, 40.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_threshold() {
        let mut config = AnalysisConfig::default();
        config.delta_r_max = 0.0;
        assert!(config.validate().is_err());
        config.delta_r_max = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_binning() {
        let mut config = AnalysisConfig::default();
        config.eta_binning = Binning::uniform(0, 0.0, 2.5);
        assert!(config.validate().is_err());
    }
}
