/// Equal-width histogram in the manner of `numpy.histogram` with an integer bin
/// count: the last bin is closed, a zero-width range is widened by 0.5 on each
/// side and an empty input spans `[0, 1]`.
#[derive(Clone, Debug, Default)]
pub struct Histogram {
    counts: Vec<usize>,
    edges: Vec<f64>,
}

impl Histogram {
    pub fn new(values: &[f32], bins: usize) -> Self {
        let mut histogram = Self::default();
        histogram.rebuild(values, bins);
        histogram
    }

    pub fn rebuild(&mut self, values: &[f32], bins: usize) {
        let bins = bins.max(1);
        let (first, last) = value_range(values);

        self.edges.clear();
        let step = (last - first) / bins as f64;
        self.edges.extend((0..bins).map(|k| first + k as f64 * step));
        self.edges.push(last);

        self.counts.clear();
        self.counts.resize(bins, 0);
        let norm = bins as f64 / (last - first);
        for &value in values {
            let value = value as f64;
            if !(first..=last).contains(&value) {
                continue;
            }
            let bin = self.bin_of(value, first, norm);
            self.counts[bin] += 1;
        }
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    fn bin_of(&self, value: f64, first: f64, norm: f64) -> usize {
        let bins = self.counts.len();
        let mut index = (((value - first) * norm) as usize).min(bins - 1);
        // the scaled index can be off by one around an edge, settle it against
        // the stored edges
        if index > 0 && value < self.edges[index] {
            index -= 1;
        }
        if index + 1 < bins && value >= self.edges[index + 1] {
            index += 1;
        }
        index
    }
}

fn value_range(values: &[f32]) -> (f64, f64) {
    let mut iter = values.iter().map(|v| *v as f64);
    let (mut min, mut max) = match iter.next() {
        Some(v) => (v, v),
        None => return (0.0, 1.0),
    };
    for v in iter {
        min = min.min(v);
        max = max.max(v);
    }
    if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bin_spans_min_max() {
        let values: Vec<f32> = (1..=9).map(|v| v as f32).collect();
        let histogram = Histogram::new(&values, 1);
        assert_eq!(histogram.counts(), &[9]);
        assert_eq!(histogram.edges(), &[1.0, 9.0]);
    }

    #[test]
    fn last_bin_is_closed() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0];
        let histogram = Histogram::new(&values, 2);
        assert_eq!(histogram.edges(), &[0.0, 2.0, 4.0]);
        // 2.0 sits on the inner edge and goes right, 4.0 stays in the last bin
        assert_eq!(histogram.counts(), &[2, 3]);
    }

    #[test]
    fn matches_numpy_layout() {
        // numpy.histogram(range(20), 4) -> [5, 5, 5, 5], edges [0, 4.75, 9.5, 14.25, 19]
        let values: Vec<f32> = (0..20).map(|v| v as f32).collect();
        let histogram = Histogram::new(&values, 4);
        assert_eq!(histogram.counts(), &[5, 5, 5, 5]);
        assert_eq!(histogram.edges(), &[0.0, 4.75, 9.5, 14.25, 19.0]);
    }

    #[test]
    fn constant_values_get_a_unit_range() {
        let histogram = Histogram::new(&[3.0; 7], 2);
        assert_eq!(histogram.edges(), &[2.5, 3.0, 3.5]);
        assert_eq!(histogram.counts(), &[0, 7]);
        assert_eq!(histogram.total(), 7);
    }

    #[test]
    fn empty_input_spans_unit_interval() {
        let histogram = Histogram::new(&[], 3);
        assert_eq!(histogram.bins(), 3);
        assert_eq!(histogram.total(), 0);
        assert_eq!(histogram.edges().first(), Some(&0.0));
        assert_eq!(histogram.edges().last(), Some(&1.0));
    }

    #[test]
    fn rebuild_reuses_buffers() {
        let mut histogram = Histogram::new(&[0.0, 10.0, 5.0], 3);
        histogram.rebuild(&[1.0, 2.0], 1);
        assert_eq!(histogram.bins(), 1);
        assert_eq!(histogram.counts(), &[2]);
        assert_eq!(histogram.edges(), &[1.0, 2.0]);
    }
}
