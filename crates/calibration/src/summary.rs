//! Calibration statistics over predicted win probabilities.
//!
//! Pure aggregation: usable (probability, outcome) samples are bucketed
//! into fixed-width reliability bins, sliced at descending probability
//! thresholds, and broken down by (symbol, timeframe, dir). Identical
//! input always yields identical output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::outcome::{coerce_float, realized_outcome, RealizedOutcome};
use signal_monitor_supabase::SignalRecord;

/// Width of one reliability bin.
pub const BIN_WIDTH: f64 = 0.05;

/// Probability cutoffs for the threshold table, descending.
pub const THRESHOLDS: &[f64] = &[0.80, 0.75, 0.70, 0.65, 0.60];

/// One usable calibration sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    /// Predicted win probability in [0, 1].
    pub win_prob: f64,
    /// Realized outcome.
    pub outcome: RealizedOutcome,
    /// Instrument symbol (`?` when absent).
    pub symbol: String,
    /// Timeframe (`?` when absent).
    pub timeframe: String,
    /// Direction (`?` when absent).
    pub dir: String,
}

/// One reliability bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityBin {
    /// Lower edge of the bin.
    pub bin: f64,
    /// Sample count.
    pub n: usize,
    /// Mean predicted probability.
    pub avg_p: f64,
    /// Realized win rate.
    pub win_rate: f64,
    /// Signed miscalibration: win rate minus mean probability.
    pub delta: f64,
}

/// One threshold slice (`p >= threshold`).
///
/// Zero-count slices keep their row with absent statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSlice {
    /// Probability cutoff.
    pub threshold: f64,
    /// Sample count at or above the cutoff.
    pub n: usize,
    /// Mean predicted probability, absent when n = 0.
    pub avg_p: Option<f64>,
    /// Realized win rate, absent when n = 0.
    pub win_rate: Option<f64>,
    /// Mean Brier score, absent when n = 0.
    pub brier: Option<f64>,
}

/// Per-(symbol, timeframe, dir) statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Instrument symbol.
    pub symbol: String,
    /// Timeframe.
    pub timeframe: String,
    /// Direction.
    pub dir: String,
    /// Sample count.
    pub n: usize,
    /// Mean predicted probability.
    pub avg_p: f64,
    /// Realized win rate.
    pub win_rate: f64,
    /// Win rate minus mean probability.
    pub delta: f64,
    /// Mean Brier score.
    pub brier: f64,
}

/// Full calibration summary for one batch of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSummary {
    /// Usable sample count.
    pub n: usize,
    /// Mean predicted probability.
    pub avg_p: f64,
    /// Realized win rate.
    pub win_rate: f64,
    /// Mean Brier score.
    pub brier: f64,
    /// Reliability bins, ascending by bin edge.
    pub bins: Vec<ReliabilityBin>,
    /// Threshold slices, in `THRESHOLDS` order.
    pub thresholds: Vec<ThresholdSlice>,
    /// Group breakdown, descending by count then lexicographic key.
    pub groups: Vec<GroupStats>,
}

impl CalibrationSummary {
    /// Returns the empty-state summary for a batch with no usable samples.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            n: 0,
            avg_p: 0.0,
            win_rate: 0.0,
            brier: 0.0,
            bins: Vec::new(),
            thresholds: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Returns true when the batch had no usable samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// Squared error of one prediction against its realized outcome.
#[must_use]
pub fn brier(prob: f64, outcome: RealizedOutcome) -> f64 {
    let d = prob - outcome.indicator();
    d * d
}

/// Bin index for a probability: `floor(p / 0.05)`, with p clamped so that
/// exactly 1.0 lands in the top bin.
fn bin_index(p: f64) -> usize {
    (p.clamp(0.0, 0.999_999) / BIN_WIDTH).floor() as usize
}

/// Lower edge of the bin with the given index, exact to two decimals.
fn bin_edge(index: usize) -> f64 {
    (index * 5) as f64 / 100.0
}

/// Filters raw rows down to usable calibration samples.
///
/// A row is usable when `win_prob` coerces to a float in [0, 1] and a
/// realized outcome can be derived. Missing grouping columns become `?`.
#[must_use]
pub fn usable_samples(records: &[SignalRecord]) -> Vec<CalibrationSample> {
    records
        .iter()
        .filter_map(|r| {
            let win_prob = r.win_prob.as_ref().and_then(coerce_float)?;
            if !(0.0..=1.0).contains(&win_prob) {
                return None;
            }
            let outcome = realized_outcome(r)?;
            Some(CalibrationSample {
                win_prob,
                outcome,
                symbol: r.symbol.clone().unwrap_or_else(|| "?".to_string()),
                timeframe: r.timeframe.clone().unwrap_or_else(|| "?".to_string()),
                dir: r.dir.clone().unwrap_or_else(|| "?".to_string()),
            })
        })
        .collect()
}

#[derive(Default)]
struct Accumulator {
    n: usize,
    sum_p: f64,
    sum_y: f64,
    sum_brier: f64,
}

impl Accumulator {
    fn push(&mut self, sample: &CalibrationSample) {
        self.n += 1;
        self.sum_p += sample.win_prob;
        self.sum_y += sample.outcome.indicator();
        self.sum_brier += brier(sample.win_prob, sample.outcome);
    }

    fn avg_p(&self) -> f64 {
        self.sum_p / self.n as f64
    }

    fn win_rate(&self) -> f64 {
        self.sum_y / self.n as f64
    }

    fn brier(&self) -> f64 {
        self.sum_brier / self.n as f64
    }
}

/// Computes the full calibration summary for a batch of raw rows.
///
/// Pure and deterministic; rerunning on the same input yields bit-identical
/// values.
#[must_use]
pub fn summarize(records: &[SignalRecord]) -> CalibrationSummary {
    let samples = usable_samples(records);
    if samples.is_empty() {
        return CalibrationSummary::empty();
    }

    let mut overall = Accumulator::default();
    let mut bins: BTreeMap<usize, Accumulator> = BTreeMap::new();
    let mut groups: BTreeMap<(String, String, String), Accumulator> = BTreeMap::new();

    for sample in &samples {
        overall.push(sample);
        bins.entry(bin_index(sample.win_prob)).or_default().push(sample);
        groups
            .entry((
                sample.symbol.clone(),
                sample.timeframe.clone(),
                sample.dir.clone(),
            ))
            .or_default()
            .push(sample);
    }

    let bin_rows = bins
        .iter()
        .map(|(&index, acc)| ReliabilityBin {
            bin: bin_edge(index),
            n: acc.n,
            avg_p: acc.avg_p(),
            win_rate: acc.win_rate(),
            delta: acc.win_rate() - acc.avg_p(),
        })
        .collect();

    let threshold_rows = THRESHOLDS
        .iter()
        .map(|&threshold| {
            let mut acc = Accumulator::default();
            for sample in samples.iter().filter(|s| s.win_prob >= threshold) {
                acc.push(sample);
            }
            if acc.n == 0 {
                ThresholdSlice {
                    threshold,
                    n: 0,
                    avg_p: None,
                    win_rate: None,
                    brier: None,
                }
            } else {
                ThresholdSlice {
                    threshold,
                    n: acc.n,
                    avg_p: Some(acc.avg_p()),
                    win_rate: Some(acc.win_rate()),
                    brier: Some(acc.brier()),
                }
            }
        })
        .collect();

    let mut group_rows: Vec<GroupStats> = groups
        .iter()
        .map(|((symbol, timeframe, dir), acc)| GroupStats {
            symbol: symbol.clone(),
            timeframe: timeframe.clone(),
            dir: dir.clone(),
            n: acc.n,
            avg_p: acc.avg_p(),
            win_rate: acc.win_rate(),
            delta: acc.win_rate() - acc.avg_p(),
            brier: acc.brier(),
        })
        .collect();
    // BTreeMap iteration is already lexicographic; a stable sort on count
    // keeps that order as the descending-n tie break.
    group_rows.sort_by(|a, b| b.n.cmp(&a.n));

    CalibrationSummary {
        n: overall.n,
        avg_p: overall.avg_p(),
        win_rate: overall.win_rate(),
        brier: overall.brier(),
        bins: bin_rows,
        thresholds: threshold_rows,
        groups: group_rows,
    }
}
