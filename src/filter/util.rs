use std::ops::Range;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub from: usize,
    pub to: usize,
}

impl RowRange {
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    pub fn rows(&self) -> Range<usize> {
        self.from..self.to
    }
}

/// Split `height` rows into `num_thread` consecutive blocks; the last block takes
/// the remainder. Blocks are contiguous and cover `0..height` in order.
pub fn create_row_ranges(num_thread: usize, height: usize) -> Vec<RowRange> {
    let num_thread = num_thread.max(1);
    let height_per_thread = height / num_thread;
    let mut ranges = Vec::with_capacity(num_thread);
    for t in 0..num_thread {
        let from = t * height_per_thread;
        let to = if t + 1 == num_thread {
            height
        } else {
            (t + 1) * height_per_thread
        };
        ranges.push(RowRange { from, to });
    }
    ranges
}

pub fn filter_progress_bar(height: usize, visible: bool) -> indicatif::ProgressBar {
    if !visible {
        return indicatif::ProgressBar::hidden();
    }
    let progress_bar = indicatif::ProgressBar::new(height as u64);
    progress_bar.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows (eta: {eta})")
            .progress_chars("#>-"),
    );
    progress_bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_cover_all_rows() {
        for threads in 1..9 {
            for height in 0..40 {
                let ranges = create_row_ranges(threads, height);
                assert_eq!(ranges.len(), threads);
                assert_eq!(ranges[0].from, 0);
                assert_eq!(ranges[threads - 1].to, height);
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].to, pair[1].from);
                }
                assert_eq!(ranges.iter().map(RowRange::len).sum::<usize>(), height);
            }
        }
    }

    #[test]
    fn last_range_takes_remainder() {
        let ranges = create_row_ranges(3, 10);
        assert_eq!(
            ranges,
            vec![
                RowRange { from: 0, to: 3 },
                RowRange { from: 3, to: 6 },
                RowRange { from: 6, to: 10 },
            ]
        );
    }

    #[test]
    fn zero_threads_means_one() {
        assert_eq!(create_row_ranges(0, 5), vec![RowRange { from: 0, to: 5 }]);
    }
}
