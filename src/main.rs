use std::path::PathBuf;

use anyhow::Context;
use structopt::StructOpt;

use masked_median::{core::rng::Rng, Field, FilterConfig, Footprint, MaskedMedianFilter};

/// Run the masked median filter on a synthetic noisy field and compare a sample
/// of pixels against the exact neighborhood median.
#[derive(StructOpt)]
#[structopt(name = "masked-median")]
struct Opt {
    /// JSON file with "radius", "threads" and "progress"
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(long, default_value = "512")]
    width: usize,
    #[structopt(long, default_value = "512")]
    height: usize,
    /// Overrides the config radius
    #[structopt(short, long)]
    radius: Option<usize>,
    /// Overrides the config thread count, 0 uses every core
    #[structopt(short, long)]
    threads: Option<usize>,
    #[structopt(long, default_value = "0")]
    seed: u64,
    /// Probability that a sample is valid
    #[structopt(long, default_value = "0.9")]
    mask_fraction: f32,
    /// Number of filtered pixels checked against the exact median
    #[structopt(long, default_value = "1000")]
    check_samples: usize,
    #[structopt(long)]
    progress: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    let mut config = match &opt.config {
        Some(path) => FilterConfig::from_json_file(path)?,
        None => FilterConfig::default(),
    };
    if let Some(radius) = opt.radius {
        config.radius = radius;
    }
    if let Some(threads) = opt.threads {
        config.threads = threads;
    }
    config.progress |= opt.progress;
    if !(0.0..=1.0).contains(&opt.mask_fraction) {
        anyhow::bail!("mask fraction should be in [0, 1], got {}", opt.mask_fraction);
    }

    let mut rng = Rng::with_seed(opt.seed);
    let image = synthetic_field(opt.width, opt.height, &mut rng);
    let input = image.padded(config.radius);
    let mask = Field::from_fn(input.width(), input.height(), |_, _| {
        rng.bernoulli(opt.mask_fraction)
    });
    let footprint = Footprint::disk(config.radius);
    log::info!(
        "synthetic {}x{} field, radius {}, {} taps",
        opt.height,
        opt.width,
        config.radius,
        footprint.count()
    );

    let filter = MaskedMedianFilter::new(config);
    let begin_time = std::time::Instant::now();
    let (output, stats) = filter
        .filter_with_stats(&input, &footprint, &mask, image.shape())
        .context("filtering failed")?;
    log::info!("finished, time used: {:?}", begin_time.elapsed());
    log::info!(
        "{} passed through, {} bucket, {} exact, {} isolated",
        stats.passed_through,
        stats.bucket,
        stats.exact,
        stats.isolated
    );

    report_deviation(&filter, &input, &footprint, &mask, &output, opt.check_samples, &mut rng)?;

    Ok(())
}

/// Smooth waves with Gaussian noise and sparse bright outliers.
fn synthetic_field(width: usize, height: usize, rng: &mut Rng) -> Field<f32> {
    Field::from_fn(width, height, |y, x| {
        let smooth = (x as f32 / 17.0).sin() * (y as f32 / 23.0).cos();
        let noise = rng.gaussian_1d(0.0, 0.1);
        let outlier = if rng.bernoulli(0.01) { 5.0 } else { 0.0 };
        smooth + noise + outlier
    })
}

fn report_deviation(
    filter: &MaskedMedianFilter,
    input: &Field<f32>,
    footprint: &Footprint,
    mask: &Field<bool>,
    output: &Field<f32>,
    samples: usize,
    rng: &mut Rng,
) -> anyhow::Result<()> {
    let (height, width) = output.shape();
    if height == 0 || width == 0 || samples == 0 {
        return Ok(());
    }
    let radius = filter.radius();

    let mut checked = 0;
    let mut deviation_sum = 0.0f64;
    let mut deviation_max = 0.0f64;
    for _ in 0..samples {
        let (rand_y, rand_x) = rng.uniform_2d();
        let i = ((rand_y * height as f32) as usize).min(height - 1);
        let j = ((rand_x * width as f32) as usize).min(width - 1);
        if !mask.get(i + radius, j + radius) {
            continue;
        }
        let mut values = filter.neighborhood(input, footprint, mask, i, j)?;
        if values.is_empty() {
            continue;
        }
        values.sort_unstable_by(|a, b| a.total_cmp(b));
        let exact = values[values.len() / 2];
        let deviation = (output.get(i, j) as f64 - exact as f64).abs();
        deviation_sum += deviation;
        deviation_max = deviation_max.max(deviation);
        checked += 1;
    }

    if checked > 0 {
        log::info!(
            "{} pixels checked, mean |approx - exact| = {:.5}, max = {:.5}",
            checked,
            deviation_sum / checked as f64,
            deviation_max
        );
    }
    Ok(())
}
