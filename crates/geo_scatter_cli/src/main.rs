#![forbid(unsafe_code)]

mod io;

use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use geo_scatter::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geo-scatter")]
#[command(about = "Sample uniformly distributed points inside KML boundaries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a KML file into the boundary JSON used by `sample`.
    Parse {
        kml: PathBuf,
        json: PathBuf,
        /// Also dump every boundary vertex as `title,latitude,longitude` CSV.
        #[arg(long)]
        debug_csv: Option<PathBuf>,
    },
    /// Sample points from a boundary JSON file into a CSV file.
    Sample {
        json: PathBuf,
        csv: PathBuf,
        #[command(flatten)]
        opts: SampleArgs,
    },
    /// Parse a KML file and sample points from it in one step.
    Run {
        kml: PathBuf,
        csv: PathBuf,
        /// Keep the intermediate boundary JSON.
        #[arg(long)]
        json: Option<PathBuf>,
        #[command(flatten)]
        opts: SampleArgs,
    },
}

#[derive(Args)]
struct SampleArgs {
    /// Total number of points across all regions.
    #[arg(long, short = 'n')]
    points: usize,
    /// Random seed; a time-based seed is used and logged when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Candidate draws allowed per accepted point.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS_PER_POINT)]
    max_attempts: u64,
    /// Spread leftover points by largest remainder instead of one random region.
    #[arg(long)]
    largest_remainder: bool,
    /// Give every region its own random stream derived from the seed.
    #[arg(long)]
    per_region_streams: bool,
}

impl SampleArgs {
    fn config(&self) -> SampleConfig {
        let policy = if self.largest_remainder {
            ResidualPolicy::LargestRemainder
        } else {
            ResidualPolicy::RandomRegion
        };
        SampleConfig::new(self.points)
            .with_max_attempts_per_point(self.max_attempts)
            .with_residual_policy(policy)
    }

    fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let started = Instant::now();

    match cli.command {
        Commands::Parse {
            kml,
            json,
            debug_csv,
        } => {
            let regions = io::read_kml(&kml)?;
            io::write_regions_json(&json, &regions)?;
            if let Some(path) = debug_csv {
                io::write_rows_csv_file(&path, regions.vertex_rows())?;
            }
        }
        Commands::Sample { json, csv, opts } => {
            let regions = io::read_regions_json(&json)?;
            sample_to_csv(&regions, &csv, &opts)?;
        }
        Commands::Run {
            kml,
            csv,
            json,
            opts,
        } => {
            let regions = io::read_kml(&kml)?;
            if let Some(path) = json {
                io::write_regions_json(&path, &regions)?;
            }
            sample_to_csv(&regions, &csv, &opts)?;
        }
    }

    info!("Done in {:.3} sec.", started.elapsed().as_secs_f64());
    Ok(())
}

fn sample_to_csv(regions: &RegionSet, csv: &std::path::Path, opts: &SampleArgs) -> Result<()> {
    let runner = SamplingRunner::try_new(opts.config())?;
    let seed = opts.seed();
    info!("Using seed {}.", seed);

    let mut progress = FnSink::only(
        &[ScatterEventKind::RegionSampled, ScatterEventKind::Warning],
        log_progress,
    );
    let result = if opts.per_region_streams {
        run_seeded(regions, &runner.config, seed, Some(&mut progress))?
    } else {
        let mut rng = StdRng::seed_from_u64(seed);
        runner.run_with_events(regions, &mut rng, &mut progress)?
    };

    io::write_rows_csv_file(csv, result.rows())?;
    Ok(())
}

fn log_progress(event: ScatterEvent) {
    match event {
        ScatterEvent::RegionSampled {
            index,
            region,
            points,
            rejected,
        } => info!(
            "[{}] {}: {} points generated, {} candidates rejected.",
            index, region, points, rejected
        ),
        ScatterEvent::Warning { context, message } => warn!("{}: {}", context, message),
        _ => {}
    }
}
