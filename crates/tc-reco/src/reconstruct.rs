//! Per-event reconstruction passes.
//!
//! [`EventReconstructor`] drives three independent passes over one event's
//! jet and truth collections and emits [`Observable`] values. It holds only
//! configuration; routing the observables into accumulators is the caller's
//! concern (see [`crate::analysis`]).

use tc_core::{Event, FourMomentum, Jet};

use crate::ancestry::is_consistent_top_decay;
use crate::config::AnalysisConfig;
use crate::matcher::{nearest_match, PidSelector};
use crate::pairs::{pairs, triples};

const B_QUARK: i32 = 5;

/// Observable channels routed into the analysis accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Jet-pT / truth-pT response ratio, binned by jet pT.
    PtResponse,
    /// Jet-pT / truth-pT response ratio, binned by |η|.
    EtaResponse,
    /// Invariant mass of b-tagged jet pairs.
    DijetMass,
    /// Invariant mass of the matched truth pair.
    DijetMassTruth,
    /// Three-jet mass of all top candidates.
    TripletMass,
    /// Three-jet mass of ancestry-confirmed top candidates.
    TripletMassMatched,
    /// Truth-level three-body mass of confirmed candidates.
    TripletMassTruth,
}

impl Channel {
    /// Stable artifact name.
    pub fn name(self) -> &'static str {
        match self {
            Channel::PtResponse => "pt_response",
            Channel::EtaResponse => "eta_response",
            Channel::DijetMass => "dijet_mass",
            Channel::DijetMassTruth => "dijet_mass_truth",
            Channel::TripletMass => "triplet_mass",
            Channel::TripletMassMatched => "triplet_mass_matched",
            Channel::TripletMassTruth => "triplet_mass_truth",
        }
    }

    /// The binning variable feeding this channel.
    pub fn binned_by(self) -> &'static str {
        match self {
            Channel::PtResponse => "jet_pt",
            Channel::EtaResponse => "abs_eta",
            _ => "mass",
        }
    }
}

/// A named scalar tagged with the value of its binning variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observable {
    /// Destination channel.
    pub channel: Channel,
    /// Binning-variable value used to locate the bin.
    pub at: f64,
    /// Accumulated quantity.
    pub value: f64,
}

impl Observable {
    fn new(channel: Channel, at: f64, value: f64) -> Self {
        Self { channel, at, value }
    }

    /// A mass-spectrum entry: binned by the mass itself.
    fn mass(channel: Channel, mass: f64) -> Self {
        Self { channel, at: mass, value: mass }
    }
}

/// Drives the per-event analysis passes.
#[derive(Debug, Clone)]
pub struct EventReconstructor {
    config: AnalysisConfig,
}

impl EventReconstructor {
    /// Reconstructor with the given thresholds.
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run all passes over one event and collect the emitted observables.
    ///
    /// Events with empty jet or truth collections produce an empty vector;
    /// that is a defined outcome, not an error.
    pub fn reconstruct(&self, event: &Event) -> Vec<Observable> {
        let mut out = Vec::new();
        self.resolution_pass(event, &mut out);
        self.dijet_pass(event, &mut out);
        self.top_candidate_pass(event, &mut out);
        out
    }

    /// Response of b-tagged jets against their matched truth b quark.
    fn resolution_pass(&self, event: &Event, out: &mut Vec<Observable>) {
        for jet in event.jets.iter().filter(|jet| jet.btag) {
            let matched = nearest_match(
                jet,
                &event.particles,
                PidSelector::AbsPid(B_QUARK),
                self.config.delta_r_max,
            );
            let Some(idx) = matched else {
                continue;
            };
            let truth_pt = event.particles[idx].pt;
            if truth_pt <= 0.0 {
                continue;
            }
            let ratio = jet.pt / truth_pt;
            out.push(Observable::new(Channel::PtResponse, jet.pt, ratio));
            out.push(Observable::new(Channel::EtaResponse, jet.eta.abs(), ratio));
        }
    }

    /// Invariant mass of every b-tagged jet pair, plus the truth-pair mass
    /// when both jets match distinct truth particles.
    fn dijet_pass(&self, event: &Event, out: &mut Vec<Observable>) {
        for (i, j) in pairs(&event.jets, |a, b| a.btag && b.btag) {
            let jet1 = &event.jets[i];
            let jet2 = &event.jets[j];
            out.push(Observable::mass(Channel::DijetMass, (jet1.p4() + jet2.p4()).mass()));

            let selector = PidSelector::AbsPid(B_QUARK);
            let gen1 = nearest_match(jet1, &event.particles, selector, self.config.delta_r_max);
            let gen2 = nearest_match(jet2, &event.particles, selector, self.config.delta_r_max);
            if let (Some(g1), Some(g2)) = (gen1, gen2) {
                if g1 != g2 {
                    let truth_mass =
                        (event.particles[g1].p4() + event.particles[g2].p4()).mass();
                    out.push(Observable::mass(Channel::DijetMassTruth, truth_mass));
                }
            }
        }
    }

    /// Combinatorial t → bW search: one b-tagged anchor above the pT cut
    /// plus an untagged pair inside the W mass window.
    fn top_candidate_pass(&self, event: &Event, out: &mut Vec<Observable>) {
        let (w_lo, w_hi) = self.config.w_mass_window;
        let anchor_ok = |jet: &Jet| jet.btag && jet.pt > self.config.anchor_pt_min;
        let pair_ok = move |a: &Jet, b: &Jet| {
            if a.btag || b.btag {
                return false;
            }
            let mass = (a.p4() + b.p4()).mass();
            (w_lo..=w_hi).contains(&mass)
        };

        for (anchor, i, j) in triples(&event.jets, anchor_ok, pair_ok) {
            let bjet = &event.jets[anchor];
            let jet1 = &event.jets[i];
            let jet2 = &event.jets[j];
            let candidate_mass = (bjet.p4() + jet1.p4() + jet2.p4()).mass();
            out.push(Observable::mass(Channel::TripletMass, candidate_mass));

            let dr = self.config.delta_r_max;
            let gen_b =
                nearest_match(bjet, &event.particles, PidSelector::AbsPid(B_QUARK), dr);
            let gen_q1 = nearest_match(jet1, &event.particles, PidSelector::Any, dr);
            let gen_q2 = nearest_match(jet2, &event.particles, PidSelector::Any, dr);
            if !is_consistent_top_decay(gen_b, gen_q1, gen_q2, &event.particles) {
                continue;
            }
            out.push(Observable::mass(Channel::TripletMassMatched, candidate_mass));
            if let (Some(b), Some(q1), Some(q2)) = (gen_b, gen_q1, gen_q2) {
                let truth_mass: f64 = [b, q1, q2]
                    .into_iter()
                    .map(|idx| event.particles[idx].p4())
                    .sum::<FourMomentum>()
                    .mass();
                out.push(Observable::mass(Channel::TripletMassTruth, truth_mass));
            }
        }
    }
}
