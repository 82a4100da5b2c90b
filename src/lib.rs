//! Approximate median filtering of 2D fields under a validity mask.
//!
//! ```
//! use masked_median::{median_mask, Field, Footprint};
//!
//! let radius = 1;
//! let image = Field::from_fn(4, 4, |y, x| (y * 4 + x) as f32);
//! let input = image.padded(radius);
//! let mask = Field::filled(input.width(), input.height(), true);
//!
//! let output = median_mask(&input, &Footprint::disk(radius), &mask, radius, image.shape()).unwrap();
//! assert_eq!(output.shape(), (4, 4));
//! ```

pub mod core;
pub mod filter;
pub mod median;

pub use crate::core::{field::Field, footprint::Footprint, histogram::Histogram};
pub use filter::{median_mask, FilterConfig, FilterStats, MaskedMedianFilter};
pub use median::{approximate_median, MedianEstimator, Refinement};
