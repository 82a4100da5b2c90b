//! Two-stage approximate median.
//!
//! The neighborhood values are first bucketed into a coarse equal-width
//! histogram holding about [`VALUES_PER_BUCKET`] values per bin. A single bin is
//! picked by walking the cumulative counts up to half the population, and only
//! the values strictly inside that bin are sorted to produce the estimate.

use crate::core::histogram::Histogram;

pub const VALUES_PER_BUCKET: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Refinement {
    Bucket,
    /// Nothing lay strictly inside the chosen bin, the exact lower median of all
    /// values was used.
    Exact,
}

#[derive(Clone, Debug, Default)]
pub struct MedianEstimator {
    histogram: Histogram,
    candidates: Vec<f32>,
}

impl MedianEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate the median of `values`, which may be reordered.
    ///
    /// Returns `None` for an empty slice. The result is always one of `values`.
    pub fn estimate(&mut self, values: &mut [f32]) -> Option<(f32, Refinement)> {
        if values.is_empty() {
            return None;
        }

        let bins = bucket_count(values.len());
        self.histogram.rebuild(values, bins);
        let index = choose_bucket(self.histogram.counts());
        let lower = self.histogram.edges()[index];
        let upper = self.histogram.edges()[index + 1];

        self.candidates.clear();
        self.candidates.extend(values.iter().copied().filter(|v| {
            let v = *v as f64;
            lower < v && v < upper
        }));
        if let Some(median) = lower_middle(&mut self.candidates) {
            return Some((median, Refinement::Bucket));
        }

        // nothing strictly inside the bin, values on its edges are not candidates
        let middle = values.len() / 2;
        let (_, median, _) = values.select_nth_unstable_by(middle, |a, b| a.total_cmp(b));
        Some((*median, Refinement::Exact))
    }
}

pub fn approximate_median(values: &[f32]) -> Option<f32> {
    let mut values = values.to_vec();
    MedianEstimator::new()
        .estimate(&mut values)
        .map(|(median, _)| median)
}

pub fn bucket_count(len: usize) -> usize {
    (len / VALUES_PER_BUCKET).max(1)
}

/// Index of the bin the refinement looks into.
///
/// Bins are accumulated from the left until the running count exceeds half the
/// total; the index then points one past the last accumulated bin. When the walk
/// runs off the end the last bin is used.
pub fn choose_bucket(counts: &[usize]) -> usize {
    let target = counts.iter().sum::<usize>() / 2;
    let mut cumsum = 0;
    let mut index = 0;
    for count in counts {
        if cumsum > target {
            break;
        }
        cumsum += count;
        index += 1;
    }
    index.min(counts.len().saturating_sub(1))
}

fn lower_middle(values: &mut Vec<f32>) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    Some(values[values.len() / 2])
}
