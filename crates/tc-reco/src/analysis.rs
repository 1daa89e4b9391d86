//! Channel accumulators and the event loop.
//!
//! [`Analysis`] is the explicitly constructed, explicitly passed accumulator
//! set: one [`BinnedAccumulator`] per observable channel. Workers processing
//! disjoint event subsets each own a private instance and are merged at the
//! end, which reduces identically to a single sequential pass.

use rayon::prelude::*;

use tc_core::{Event, Result};

use crate::artifact::{AnalysisArtifact, ArtifactMeta, ChannelSummary, ARTIFACT_SCHEMA_VERSION};
use crate::binned::BinnedAccumulator;
use crate::config::AnalysisConfig;
use crate::reconstruct::{Channel, EventReconstructor};

const CHANNELS: [Channel; 7] = [
    Channel::PtResponse,
    Channel::EtaResponse,
    Channel::DijetMass,
    Channel::DijetMassTruth,
    Channel::TripletMass,
    Channel::TripletMassMatched,
    Channel::TripletMassTruth,
];

/// Events per worker chunk in [`run_parallel`].
const PARALLEL_CHUNK: usize = 256;

/// The full per-run analysis state: reconstructor plus channel accumulators.
pub struct Analysis {
    reconstructor: EventReconstructor,
    pt_response: BinnedAccumulator,
    eta_response: BinnedAccumulator,
    dijet_mass: BinnedAccumulator,
    dijet_mass_truth: BinnedAccumulator,
    triplet_mass: BinnedAccumulator,
    triplet_mass_matched: BinnedAccumulator,
    triplet_mass_truth: BinnedAccumulator,
    n_events: u64,
}

impl Analysis {
    /// Build the accumulator set from a validated configuration.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pt_response: BinnedAccumulator::new(config.pt_binning.clone()),
            eta_response: BinnedAccumulator::new(config.eta_binning.clone()),
            dijet_mass: BinnedAccumulator::new(config.dijet_mass_binning.clone()),
            dijet_mass_truth: BinnedAccumulator::new(config.dijet_mass_binning.clone()),
            triplet_mass: BinnedAccumulator::new(config.triplet_mass_binning.clone()),
            triplet_mass_matched: BinnedAccumulator::new(config.triplet_mass_binning.clone()),
            triplet_mass_truth: BinnedAccumulator::new(config.triplet_mass_binning.clone()),
            reconstructor: EventReconstructor::new(config),
            n_events: 0,
        })
    }

    /// Number of processed events.
    pub fn n_events(&self) -> u64 {
        self.n_events
    }

    /// The accumulator backing one channel.
    pub fn accumulator(&self, channel: Channel) -> &BinnedAccumulator {
        match channel {
            Channel::PtResponse => &self.pt_response,
            Channel::EtaResponse => &self.eta_response,
            Channel::DijetMass => &self.dijet_mass,
            Channel::DijetMassTruth => &self.dijet_mass_truth,
            Channel::TripletMass => &self.triplet_mass,
            Channel::TripletMassMatched => &self.triplet_mass_matched,
            Channel::TripletMassTruth => &self.triplet_mass_truth,
        }
    }

    fn accumulator_mut(&mut self, channel: Channel) -> &mut BinnedAccumulator {
        match channel {
            Channel::PtResponse => &mut self.pt_response,
            Channel::EtaResponse => &mut self.eta_response,
            Channel::DijetMass => &mut self.dijet_mass,
            Channel::DijetMassTruth => &mut self.dijet_mass_truth,
            Channel::TripletMass => &mut self.triplet_mass,
            Channel::TripletMassMatched => &mut self.triplet_mass_matched,
            Channel::TripletMassTruth => &mut self.triplet_mass_truth,
        }
    }

    /// Reconstruct one event and route its observables.
    pub fn process(&mut self, event: &Event) {
        self.n_events += 1;
        for obs in self.reconstructor.reconstruct(event) {
            self.accumulator_mut(obs.channel).fill(obs.at, obs.value);
        }
    }

    /// Fold another analysis over the same configuration into this one.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        for channel in CHANNELS {
            self.accumulator_mut(channel).merge(other.accumulator(channel))?;
        }
        self.n_events += other.n_events;
        Ok(())
    }

    /// Reduce all channels into the final artifact.
    pub fn finalize(&self) -> AnalysisArtifact {
        let channels = CHANNELS
            .into_iter()
            .map(|channel| ChannelSummary {
                name: channel.name().to_string(),
                binned_by: channel.binned_by().to_string(),
                summary: self.accumulator(channel).reduce(),
            })
            .collect();
        AnalysisArtifact {
            schema_version: ARTIFACT_SCHEMA_VERSION.to_string(),
            meta: ArtifactMeta::new(self.n_events),
            channels,
        }
    }
}

/// Sequential event loop.
pub fn run(config: &AnalysisConfig, events: &[Event]) -> Result<Analysis> {
    let mut analysis = Analysis::new(config.clone())?;
    for event in events {
        analysis.process(event);
    }
    Ok(analysis)
}

/// Parallel event loop: per-worker accumulators over event chunks, merged
/// at the end. The moments are associative and commutative, so the result
/// matches [`run`] exactly.
pub fn run_parallel(config: &AnalysisConfig, events: &[Event]) -> Result<Analysis> {
    let partials = events
        .par_chunks(PARALLEL_CHUNK)
        .map(|chunk| {
            let mut partial = Analysis::new(config.clone())?;
            for event in chunk {
                partial.process(event);
            }
            Ok(partial)
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(workers = partials.len(), "merging worker accumulators");
    let mut merged = Analysis::new(config.clone())?;
    for partial in &partials {
        merged.merge(partial)?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use tc_core::{GenParticle, Jet};

    use super::*;

    fn calibration_event(scale: f64) -> Event {
        Event {
            jets: vec![Jet { pt: 50.0 * scale, eta: 1.0, phi: 0.5, mass: 0.0, btag: true }],
            particles: vec![GenParticle {
                pid: 5,
                pt: 45.0,
                eta: 1.02,
                phi: 0.52,
                mass: 0.0,
                mother: None,
            }],
        }
    }

    /// Counts must agree exactly; sums may differ by summation order, so
    /// means and spreads are compared to within a few ulps.
    fn assert_summary_close(a: &crate::binned::BinnedSummary, b: &crate::binned::BinnedSummary) {
        assert_eq!(a.edges, b.edges);
        assert_eq!(a.count, b.count);
        assert_eq!(a.insufficient_stats, b.insufficient_stats);
        assert_eq!(a.dropped, b.dropped);
        for (x, y) in a.mean.iter().zip(&b.mean).chain(a.std_error.iter().zip(&b.std_error)) {
            assert!((x - y).abs() <= 1e-12 * x.abs().max(1.0), "{x} vs {y}");
        }
    }

    fn dijet_event() -> Event {
        Event {
            jets: vec![
                Jet { pt: 45.6, eta: 0.0, phi: 0.0, mass: 0.0, btag: true },
                Jet { pt: 45.6, eta: 0.0, phi: PI, mass: 0.0, btag: true },
            ],
            particles: vec![],
        }
    }

    #[test]
    fn routes_observables_into_channels() {
        let mut analysis = Analysis::new(AnalysisConfig::default()).unwrap();
        analysis.process(&calibration_event(1.0));
        analysis.process(&dijet_event());
        assert_eq!(analysis.n_events(), 2);

        let pt = analysis.accumulator(Channel::PtResponse).reduce();
        // jet pT 50 lands in bin [50, 60), index 3 of the default binning.
        assert_eq!(pt.count[3], 1.0);
        assert!((pt.mean[3] - 50.0 / 45.0).abs() < 1e-12);

        let dijet = analysis.accumulator(Channel::DijetMass).reduce();
        assert_eq!(dijet.count.iter().sum::<f64>(), 1.0);
        assert_eq!(analysis.accumulator(Channel::TripletMass).reduce().count.iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.delta_r_max = -1.0;
        assert!(Analysis::new(config).is_err());
    }

    #[test]
    fn merge_is_equivalent_to_sequential() {
        let events: Vec<Event> = (0..10)
            .map(|i| if i % 2 == 0 { calibration_event(1.0 + i as f64 / 100.0) } else { dijet_event() })
            .collect();
        let config = AnalysisConfig::default();

        let whole = run(&config, &events).unwrap();

        let mut left = Analysis::new(config.clone()).unwrap();
        let mut right = Analysis::new(config.clone()).unwrap();
        for event in &events[..4] {
            left.process(event);
        }
        for event in &events[4..] {
            right.process(event);
        }
        left.merge(&right).unwrap();

        assert_eq!(left.n_events(), whole.n_events());
        for channel in CHANNELS {
            assert_summary_close(
                &left.accumulator(channel).reduce(),
                &whole.accumulator(channel).reduce(),
            );
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let events: Vec<Event> =
            (0..600).map(|i| calibration_event(1.0 + (i % 7) as f64 / 50.0)).collect();
        let config = AnalysisConfig::default();

        let sequential = run(&config, &events).unwrap();
        let parallel = run_parallel(&config, &events).unwrap();

        assert_eq!(parallel.n_events(), sequential.n_events());
        for channel in CHANNELS {
            assert_summary_close(
                &parallel.accumulator(channel).reduce(),
                &sequential.accumulator(channel).reduce(),
            );
        }
    }

    #[test]
    fn finalize_emits_every_channel() {
        let analysis = Analysis::new(AnalysisConfig::default()).unwrap();
        let artifact = analysis.finalize();
        assert_eq!(artifact.schema_version, ARTIFACT_SCHEMA_VERSION);
        assert_eq!(artifact.channels.len(), CHANNELS.len());
        assert_eq!(artifact.channels[0].name, "pt_response");
        assert_eq!(artifact.channels[0].binned_by, "jet_pt");
        assert_eq!(artifact.channels[2].binned_by, "mass");
    }
}
