//! Streaming per-bin moment accumulation.
//!
//! A [`BinnedAccumulator`] keeps count, sum and sum-of-squares per bin while
//! events stream through, and reduces to mean plus spread at the end. The
//! three moments are associative and commutative under addition, so
//! accumulators filled on disjoint event subsets can be merged bin-wise and
//! reduce to the same result as a single sequential pass.

use serde::{Deserialize, Serialize};

use tc_core::{Error, Result};

/// Sorted bin edges for one binning variable. Bins are half-open `[lo, hi)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binning {
    edges: Vec<f64>,
}

impl Binning {
    /// Build from explicit edges. Edges must be finite and strictly
    /// increasing, with at least two entries.
    pub fn from_edges(edges: Vec<f64>) -> Result<Self> {
        let binning = Self { edges };
        binning.validate()?;
        Ok(binning)
    }

    /// Equal-width binning over `[lo, hi)`.
    ///
    /// Validity (`lo < hi`, `n_bins > 0`, finite edges) is checked by
    /// [`Binning::validate`], which configuration loading always runs.
    pub fn uniform(n_bins: usize, lo: f64, hi: f64) -> Self {
        let width = (hi - lo) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| lo + width * i as f64).collect();
        edges.push(hi);
        Self { edges }
    }

    /// Check the edge invariants.
    pub fn validate(&self) -> Result<()> {
        if self.edges.len() < 2 {
            return Err(Error::Validation(format!(
                "binning needs at least 2 edges, got {}",
                self.edges.len()
            )));
        }
        for pair in self.edges.windows(2) {
            if !pair[0].is_finite() || !pair[1].is_finite() || pair[0] >= pair[1] {
                return Err(Error::Validation(format!(
                    "bin edges must be finite and strictly increasing, got [{}, {}]",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// The bin edges.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin index containing `x`, or `None` when `x` lies outside
    /// `[first_edge, last_edge)` or is NaN.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        let (first, last) = match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return None,
        };
        if x.is_nan() || x < first || x >= last {
            return None;
        }
        Some(self.edges.partition_point(|&edge| edge <= x) - 1)
    }
}

/// Online accumulation of weighted count, sum and sum-of-squares per bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedAccumulator {
    binning: Binning,
    count: Vec<f64>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    dropped: u64,
}

impl BinnedAccumulator {
    /// Empty accumulator over the given binning.
    pub fn new(binning: Binning) -> Self {
        let n = binning.n_bins();
        Self { binning, count: vec![0.0; n], sum: vec![0.0; n], sum_sq: vec![0.0; n], dropped: 0 }
    }

    /// The accumulator's binning.
    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    /// Entries whose binning variable fell outside all bins.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Unit-weight [`BinnedAccumulator::fill_weighted`].
    pub fn fill(&mut self, at: f64, value: f64) {
        self.fill_weighted(at, value, 1.0);
    }

    /// Accumulate `value` with `weight` into the bin containing `at`.
    ///
    /// Out-of-range `at` is counted in [`BinnedAccumulator::dropped`] and
    /// otherwise ignored; it is not an error.
    pub fn fill_weighted(&mut self, at: f64, value: f64, weight: f64) {
        match self.binning.find_bin(at) {
            Some(bin) => {
                self.count[bin] += weight;
                self.sum[bin] += weight * value;
                self.sum_sq[bin] += weight * value * value;
            }
            None => self.dropped += 1,
        }
    }

    /// Bin-wise addition of another accumulator filled over the same binning.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.binning != other.binning {
            return Err(Error::Validation(
                "cannot merge accumulators with different binnings".into(),
            ));
        }
        for bin in 0..self.count.len() {
            self.count[bin] += other.count[bin];
            self.sum[bin] += other.sum[bin];
            self.sum_sq[bin] += other.sum_sq[bin];
        }
        self.dropped += other.dropped;
        Ok(())
    }

    /// Reduce to per-bin mean and spread.
    ///
    /// Empty bins reduce to zero mean and spread and are flagged as having
    /// insufficient statistics. The variance is clamped at zero before the
    /// square root; floating-point cancellation can push the raw second
    /// moment slightly negative.
    pub fn reduce(&self) -> BinnedSummary {
        let n = self.count.len();
        let mut mean = vec![0.0; n];
        let mut std_error = vec![0.0; n];
        let mut insufficient_stats = vec![false; n];
        for bin in 0..n {
            let count = self.count[bin];
            if count > 0.0 {
                let m = self.sum[bin] / count;
                let variance = (self.sum_sq[bin] / count - m * m).max(0.0);
                mean[bin] = m;
                std_error[bin] = variance.sqrt();
            } else {
                insufficient_stats[bin] = true;
            }
        }
        BinnedSummary {
            edges: self.binning.edges().to_vec(),
            count: self.count.clone(),
            mean,
            std_error,
            insufficient_stats,
            dropped: self.dropped,
        }
    }
}

/// Reduced view of a [`BinnedAccumulator`]: plot-friendly flat arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinnedSummary {
    /// Bin edges (length = number of bins + 1).
    pub edges: Vec<f64>,
    /// Accumulated weight per bin.
    pub count: Vec<f64>,
    /// Per-bin mean of the accumulated value.
    pub mean: Vec<f64>,
    /// Per-bin spread, √max(0, ⟨v²⟩ − ⟨v⟩²).
    pub std_error: Vec<f64>,
    /// True for bins with zero accumulated weight.
    pub insufficient_stats: Vec<bool>,
    /// Entries dropped because the binning variable was out of range.
    pub dropped: u64,
}
