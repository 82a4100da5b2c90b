mod util;

pub use util::{create_row_ranges, RowRange};

use std::path::Path;

use crate::{
    core::{field::Field, footprint::Footprint, params::InputParams},
    median::{MedianEstimator, Refinement},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilterConfig {
    pub radius: usize,
    /// Worker threads, `0` uses every logical core.
    pub threads: usize,
    pub progress: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            radius: 10,
            threads: 0,
            progress: false,
        }
    }
}

impl FilterConfig {
    pub fn with_radius(radius: usize) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    pub fn from_params(params: &mut InputParams) -> anyhow::Result<Self> {
        let default = Self::default();

        let radius = params.get_int_or("radius", default.radius as i32)?;
        if radius < 0 {
            anyhow::bail!("{} - 'radius' should be non-negative, got {}", params.name(), radius);
        }
        let threads = params.get_int_or("threads", default.threads as i32)?;
        if threads < 0 {
            anyhow::bail!("{} - 'threads' should be non-negative, got {}", params.name(), threads);
        }
        let progress = params.get_bool_or("progress", default.progress)?;

        params.check_unused_keys();

        Ok(Self {
            radius: radius as usize,
            threads: threads as usize,
            progress,
        })
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let mut params = InputParams::from_json_str("filter", json)?;
        Self::from_params(&mut params)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut params = InputParams::from_json_file(path)?;
        Self::from_params(&mut params)
    }

    pub fn num_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

/// How the pixels of one call were produced.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub passed_through: usize,
    pub bucket: usize,
    pub exact: usize,
    /// centre valid but no usable neighbor, value copied
    pub isolated: usize,
}

impl FilterStats {
    pub fn total(&self) -> usize {
        self.passed_through + self.bucket + self.exact + self.isolated
    }

    pub fn merge(&mut self, other: &FilterStats) {
        self.passed_through += other.passed_through;
        self.bucket += other.bucket;
        self.exact += other.exact;
        self.isolated += other.isolated;
    }
}

/// Approximate median filter restricted to a validity mask.
///
/// `input` and `mask` are padded by `radius` on every side; output pixel `(i, j)`
/// is centred at `(i + radius, j + radius)` of the padded fields. Centres whose
/// mask entry is false are copied unchanged. Other centres get the approximate
/// median (see [`crate::median`]) of the samples where both the footprint and
/// the mask are true.
pub struct MaskedMedianFilter {
    config: FilterConfig,
}

impl MaskedMedianFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn radius(&self) -> usize {
        self.config.radius
    }

    pub fn validate(
        &self,
        input: &Field<f32>,
        footprint: &Footprint,
        mask: &Field<bool>,
        shape: (usize, usize),
    ) -> anyhow::Result<()> {
        let radius = self.radius();
        if footprint.radius() != radius {
            anyhow::bail!(
                "footprint is {}x{} but radius {} needs {}x{}",
                footprint.side(),
                footprint.side(),
                radius,
                2 * radius + 1,
                2 * radius + 1
            );
        }
        if mask.shape() != input.shape() {
            anyhow::bail!(
                "mask is {}x{} but input is {}x{}",
                mask.height(),
                mask.width(),
                input.height(),
                input.width()
            );
        }
        let (height, width) = shape;
        let need_height = height + 2 * radius;
        let need_width = width + 2 * radius;
        if input.height() < need_height || input.width() < need_width {
            anyhow::bail!(
                "input is {}x{} but a {}x{} output with radius {} needs at least {}x{}",
                input.height(),
                input.width(),
                height,
                width,
                radius,
                need_height,
                need_width
            );
        }
        Ok(())
    }

    pub fn filter(
        &self,
        input: &Field<f32>,
        footprint: &Footprint,
        mask: &Field<bool>,
        shape: (usize, usize),
    ) -> anyhow::Result<Field<f32>> {
        self.filter_with_stats(input, footprint, mask, shape)
            .map(|(output, _)| output)
    }

    pub fn filter_with_stats(
        &self,
        input: &Field<f32>,
        footprint: &Footprint,
        mask: &Field<bool>,
        shape: (usize, usize),
    ) -> anyhow::Result<(Field<f32>, FilterStats)> {
        self.validate(input, footprint, mask, shape)?;

        let (height, width) = shape;
        let mut output = Field::<f32>::new(width, height);
        if height == 0 || width == 0 {
            return Ok((output, FilterStats::default()));
        }

        let num_threads = self.config.num_threads().min(height);
        let ranges = util::create_row_ranges(num_threads, height);
        log::info!(
            "median filter: {}x{} output, radius {}, {} active taps, {} threads",
            height,
            width,
            self.radius(),
            footprint.count(),
            num_threads
        );

        let progress_bar = util::filter_progress_bar(height, self.config.progress);
        let radius = self.radius();

        let results = crossbeam::scope(|scope| {
            let mut rest = output.as_mut_slice();
            let mut handles = Vec::with_capacity(ranges.len());
            for range in ranges.iter().copied() {
                let (block, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * width);
                rest = tail;
                let progress_bar = progress_bar.clone();

                handles.push(scope.spawn(move |_| {
                    let mut worker = RowWorker::new(input, footprint, mask, radius);
                    for (i, out_row) in range.rows().zip(block.chunks_mut(width)) {
                        worker.run_row(i, out_row);
                        progress_bar.inc(1);
                    }
                    worker.stats
                }));
            }
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        })
        .map_err(|_| anyhow::anyhow!("median filter worker panicked"))?;

        let mut stats = FilterStats::default();
        for result in results {
            let worker_stats =
                result.map_err(|_| anyhow::anyhow!("median filter worker panicked"))?;
            stats.merge(&worker_stats);
        }
        progress_bar.finish_and_clear();

        log::debug!(
            "median filter: {} passed through, {} bucket, {} exact, {} isolated",
            stats.passed_through,
            stats.bucket,
            stats.exact,
            stats.isolated
        );

        Ok((output, stats))
    }

    /// Compute logical row `row` alone into `out`, which must hold one output row.
    ///
    /// Gives the same values as the row of a full [`MaskedMedianFilter::filter`].
    pub fn filter_row(
        &self,
        input: &Field<f32>,
        footprint: &Footprint,
        mask: &Field<bool>,
        shape: (usize, usize),
        row: usize,
        out: &mut [f32],
    ) -> anyhow::Result<FilterStats> {
        self.validate(input, footprint, mask, shape)?;
        let (height, width) = shape;
        if row >= height {
            anyhow::bail!("row {} is out of range for {} rows", row, height);
        }
        if out.len() != width {
            anyhow::bail!("row buffer has {} elements, expected {}", out.len(), width);
        }

        let mut worker = RowWorker::new(input, footprint, mask, self.radius());
        worker.run_row(row, out);
        Ok(worker.stats)
    }

    /// The samples the filter would look at for logical pixel `(i, j)`.
    pub fn neighborhood(
        &self,
        input: &Field<f32>,
        footprint: &Footprint,
        mask: &Field<bool>,
        i: usize,
        j: usize,
    ) -> anyhow::Result<Vec<f32>> {
        self.validate(input, footprint, mask, (0, 0))?;
        let side = footprint.side();
        if i + side > input.height() || j + side > input.width() {
            anyhow::bail!(
                "pixel ({}, {}) has no full {}x{} window in a {}x{} input",
                i,
                j,
                side,
                side,
                input.height(),
                input.width()
            );
        }
        let mut worker = RowWorker::new(input, footprint, mask, self.radius());
        worker.gather(i, j);
        Ok(worker.selection)
    }
}

pub fn median_mask(
    input: &Field<f32>,
    footprint: &Footprint,
    mask: &Field<bool>,
    radius: usize,
    shape: (usize, usize),
) -> anyhow::Result<Field<f32>> {
    MaskedMedianFilter::new(FilterConfig::with_radius(radius)).filter(input, footprint, mask, shape)
}

/// Per-thread state: borrowed inputs plus scratch buffers reused for every pixel.
struct RowWorker<'a> {
    input: &'a [f32],
    mask: &'a [bool],
    taps: &'a [bool],
    stride: usize,
    radius: usize,
    selection: Vec<f32>,
    estimator: MedianEstimator,
    stats: FilterStats,
}

impl<'a> RowWorker<'a> {
    fn new(
        input: &'a Field<f32>,
        footprint: &'a Footprint,
        mask: &'a Field<bool>,
        radius: usize,
    ) -> Self {
        Self {
            input: input.as_slice(),
            mask: mask.as_slice(),
            taps: footprint.as_slice(),
            stride: input.width(),
            radius,
            selection: Vec::with_capacity(footprint.count()),
            estimator: MedianEstimator::new(),
            stats: FilterStats::default(),
        }
    }

    fn run_row(&mut self, i: usize, out: &mut [f32]) {
        for (j, pixel) in out.iter_mut().enumerate() {
            *pixel = self.run_pixel(i, j);
        }
    }

    fn run_pixel(&mut self, i: usize, j: usize) -> f32 {
        let centre = (i + self.radius) * self.stride + j + self.radius;
        let centre_value = self.input[centre];
        if !self.mask[centre] {
            self.stats.passed_through += 1;
            return centre_value;
        }

        self.gather(i, j);
        match self.estimator.estimate(&mut self.selection) {
            Some((median, refinement)) => {
                match refinement {
                    Refinement::Bucket => self.stats.bucket += 1,
                    Refinement::Exact => self.stats.exact += 1,
                }
                median
            }
            None => {
                self.stats.isolated += 1;
                centre_value
            }
        }
    }

    // finite samples under footprint and mask, window top-left at (i, j)
    fn gather(&mut self, i: usize, j: usize) {
        let side = 2 * self.radius + 1;
        self.selection.clear();
        for dy in 0..side {
            let base = (i + dy) * self.stride + j;
            let taps = &self.taps[dy * side..(dy + 1) * side];
            let values = &self.input[base..base + side];
            let valid = &self.mask[base..base + side];
            for ((tap, value), ok) in taps.iter().zip(values).zip(valid) {
                if *tap && *ok && value.is_finite() {
                    self.selection.push(*value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Field<f32> {
        Field::from_fn(width, height, |y, x| (y * width + x) as f32)
    }

    #[test]
    fn one_to_nine_window() {
        let input = Field::from_vec(3, 3, (1..=9).map(|v| v as f32).collect()).unwrap();
        let mask = Field::filled(3, 3, true);
        let output = median_mask(&input, &Footprint::full(1), &mask, 1, (1, 1)).unwrap();
        assert_eq!(output.shape(), (1, 1));
        let value = output.get(0, 0);
        assert!((1.0..=9.0).contains(&value));
        assert_eq!(value, 5.0);
    }

    #[test]
    fn false_centre_is_copied() {
        let input = ramp(5, 5);
        let mut mask = Field::filled(5, 5, true);
        mask.set(2, 2, false);
        let output = median_mask(&input, &Footprint::disk(2), &mask, 2, (1, 1)).unwrap();
        assert_eq!(output.get(0, 0).to_bits(), input.get(2, 2).to_bits());
    }

    #[test]
    fn masked_neighbors_are_ignored() {
        // only the centre column is valid, so the selection is [1, 4, 7]
        let input = ramp(3, 3);
        let mask = Field::from_fn(3, 3, |_, x| x == 1);
        let output = median_mask(&input, &Footprint::full(1), &mask, 1, (1, 1)).unwrap();
        assert_eq!(output.get(0, 0), 4.0);
    }

    #[test]
    fn isolated_centre_keeps_its_value() {
        // footprint without the centre and every neighbor masked out
        let mut taps = vec![true; 9];
        taps[4] = false;
        let footprint = Footprint::new(1, taps).unwrap();
        let input = ramp(3, 3);
        let mask = Field::from_fn(3, 3, |y, x| y == 1 && x == 1);
        let filter = MaskedMedianFilter::new(FilterConfig::with_radius(1));
        let (output, stats) = filter
            .filter_with_stats(&input, &footprint, &mask, (1, 1))
            .unwrap();
        assert_eq!(output.get(0, 0), 4.0);
        assert_eq!(stats.isolated, 1);
    }

    #[test]
    fn non_finite_samples_are_skipped() {
        let mut input = Field::filled(3, 3, 2.0f32);
        input.set(0, 0, f32::NAN);
        input.set(2, 2, f32::INFINITY);
        let mask = Field::filled(3, 3, true);
        let output = median_mask(&input, &Footprint::full(1), &mask, 1, (1, 1)).unwrap();
        assert_eq!(output.get(0, 0), 2.0);
    }

    #[test]
    fn stats_count_every_pixel() {
        let input = ramp(12, 9).padded(2);
        let mask = Field::from_fn(input.width(), input.height(), |y, x| (x + y) % 3 != 0);
        let filter = MaskedMedianFilter::new(FilterConfig {
            radius: 2,
            threads: 3,
            progress: false,
        });
        let (output, stats) = filter
            .filter_with_stats(&input, &Footprint::disk(2), &mask, (9, 12))
            .unwrap();
        assert_eq!(output.shape(), (9, 12));
        assert_eq!(stats.total(), 9 * 12);
    }

    #[test]
    fn rejects_bad_shapes() {
        let input = ramp(5, 5);
        let mask = Field::filled(5, 5, true);
        let filter = MaskedMedianFilter::new(FilterConfig::with_radius(1));

        // footprint radius differs
        assert!(filter
            .filter(&input, &Footprint::disk(2), &mask, (3, 3))
            .is_err());
        // mask shape differs
        let small_mask = Field::filled(4, 5, true);
        assert!(filter
            .filter(&input, &Footprint::disk(1), &small_mask, (3, 3))
            .is_err());
        // output too large for the padding
        assert!(filter
            .filter(&input, &Footprint::disk(1), &mask, (4, 3))
            .is_err());
        assert!(filter
            .filter(&input, &Footprint::disk(1), &mask, (3, 3))
            .is_ok());
    }

    #[test]
    fn empty_output() {
        let input = ramp(2, 2);
        let mask = Field::filled(2, 2, true);
        let output = median_mask(&input, &Footprint::disk(1), &mask, 1, (0, 0)).unwrap();
        assert_eq!(output.shape(), (0, 0));
    }

    #[test]
    fn filter_row_checks_arguments() {
        let input = ramp(5, 5);
        let mask = Field::filled(5, 5, true);
        let footprint = Footprint::disk(1);
        let filter = MaskedMedianFilter::new(FilterConfig::with_radius(1));
        let mut row = vec![0.0; 3];
        assert!(filter
            .filter_row(&input, &footprint, &mask, (3, 3), 3, &mut row)
            .is_err());
        let mut short = vec![0.0; 2];
        assert!(filter
            .filter_row(&input, &footprint, &mask, (3, 3), 0, &mut short)
            .is_err());
        assert!(filter
            .filter_row(&input, &footprint, &mask, (3, 3), 2, &mut row)
            .is_ok());
    }

    #[test]
    fn config_from_json() {
        let config = FilterConfig::from_json_str(r#"{"radius": 4, "threads": 2}"#).unwrap();
        assert_eq!(
            config,
            FilterConfig {
                radius: 4,
                threads: 2,
                progress: false
            }
        );
        assert_eq!(config.num_threads(), 2);

        let config = FilterConfig::from_json_str("{}").unwrap();
        assert_eq!(config, FilterConfig::default());
        assert!(config.num_threads() >= 1);

        assert!(FilterConfig::from_json_str(r#"{"radius": -1}"#).is_err());
        assert!(FilterConfig::from_json_str(r#"{"threads": -2}"#).is_err());
        assert!(FilterConfig::from_json_str(r#"{"progress": 1}"#).is_err());
    }
}
