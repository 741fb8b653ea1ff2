//! Per-channel frequency series storage
//!
//! Each batch message carries sampling groups; group position `i` holds the
//! sample for frequency bin `i`. The store keeps one sample sequence per bin
//! per channel, creating bins on first sight. Bin indices only grow between
//! clears; a bin is never removed while its channel holds data.

use crate::types::{Channel, FrequencyLabels, LineSeries};
use std::collections::BTreeMap;

/// Sample sequences for both measurement channels, keyed by bin index
///
/// Malformed input cannot reach this layer; the decoder has already
/// validated shape, so none of these operations can fail.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    raw: BTreeMap<usize, Vec<f64>>,
    conductivity: BTreeMap<usize, Vec<f64>>,
}

impl SeriesStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn bins(&self, channel: Channel) -> &BTreeMap<usize, Vec<f64>> {
        match channel {
            Channel::Raw => &self.raw,
            Channel::Conductivity => &self.conductivity,
        }
    }

    fn bins_mut(&mut self, channel: Channel) -> &mut BTreeMap<usize, Vec<f64>> {
        match channel {
            Channel::Raw => &mut self.raw,
            Channel::Conductivity => &mut self.conductivity,
        }
    }

    /// Fold sampling groups into the channel's bins
    ///
    /// For each group, value `i` is appended to bin `i`'s sequence, creating
    /// the sequence on first sight. Arrival order is preserved per bin.
    pub fn apply(&mut self, channel: Channel, groups: &[Vec<f64>]) {
        let bins = self.bins_mut(channel);
        for group in groups {
            for (bin, &value) in group.iter().enumerate() {
                bins.entry(bin).or_default().push(value);
            }
        }
    }

    /// Drop all of a channel's bins
    pub fn clear(&mut self, channel: Channel) {
        self.bins_mut(channel).clear();
    }

    /// Convert a channel's bins into labeled, plottable line series
    ///
    /// One entry per bin in ascending bin order. The x coordinate is the
    /// 0-based position within that bin's own sequence, recomputed here;
    /// bins created at different times are not synchronized.
    pub fn line_series(&self, channel: Channel, labels: &FrequencyLabels) -> Vec<LineSeries> {
        self.bins(channel)
            .iter()
            .map(|(&bin, samples)| LineSeries {
                label: labels.label(bin),
                points: samples
                    .iter()
                    .enumerate()
                    .map(|(x, &y)| [x as f64, y])
                    .collect(),
            })
            .collect()
    }

    /// Number of bins currently held for a channel
    pub fn bin_count(&self, channel: Channel) -> usize {
        self.bins(channel).len()
    }

    /// The sample sequence for one bin, if it exists
    pub fn samples(&self, channel: Channel, bin: usize) -> Option<&[f64]> {
        self.bins(channel).get(&bin).map(|v| v.as_slice())
    }
}
