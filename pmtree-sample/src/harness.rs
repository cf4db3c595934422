//! Sampling sweeps and single-tree evaluation.
//!
//! `sample` draws plausible trees from consecutive seeds and writes one
//! `[params],[stats]` line per tree. `evaluate` generates one tree from a
//! parameter file (or the shipped defaults) and prints its record.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use pmtree_core::{
    TreeModel, TreeParameters,
    config::Config,
    error::{ParamError, SampleError},
    record::SampleRecord,
    sampler::Sampler,
    shape::Shape,
    stats::StatisticsKind,
};

/// Log progress every this many accepted samples.
const PROGRESS_INTERVAL: usize = 1000;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("unknown statistics type {0}, expected 0 to 3")]
    UnknownStatistics(u32),
}

#[derive(clap::Parser)]
#[command(version, about = "Generate parametric trees and their shape statistics")]
pub enum Command {
    /// Draw plausible random trees and write one sample record per line
    Sample(SampleArgs),
    /// Generate a single tree and print its verdict and record
    Evaluate(EvaluateArgs),
}

#[derive(clap::Args)]
pub struct SampleArgs {
    /// Number of plausible trees to write
    #[arg(long, short = 'n', default_value_t = 10_000)]
    count: usize,

    /// First seed of the sweep; every attempt uses the next one
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Statistics vector: 0 summary, 1 density histogram, 2 both histograms, 3 height
    #[arg(long, default_value_t = 2)]
    stats: u32,

    /// Give up on a sample after this many implausible trees
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Output file. Writes to stdout if not specified.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JSON file overriding the generation settings
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct EvaluateArgs {
    /// JSON file with tree parameters. Uses the shipped defaults if not specified.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Seed for the bend angles
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Statistics vector: 0 summary, 1 density histogram, 2 both histograms, 3 height
    #[arg(long, default_value_t = 2)]
    stats: u32,

    /// JSON file overriding the generation settings
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Sample(args) => sample(args),
        Command::Evaluate(args) => evaluate(args),
    }
}

fn sample(args: SampleArgs) -> Result<(), Error> {
    let kind = statistics_kind(args.stats)?;
    let cfg = load_config(args.config.as_deref())?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut model = TreeModel::new(TreeParameters::default(), cfg);
    let mut sampler = Sampler::new(args.seed);
    sampler.max_attempts = args.max_attempts;

    log::info!("Sampling {} trees from seed {}", args.count, args.seed);
    let mut total_attempts = 0u64;
    for i in 0..args.count {
        let accepted = sampler.next_valid(&mut model)?;
        total_attempts += u64::from(accepted.attempts);

        let record = SampleRecord {
            params: model.params_vector(),
            statistics: model.statistics_vector(kind),
        };
        writeln!(out, "{record}")?;

        if (i + 1) % PROGRESS_INTERVAL == 0 {
            log::info!("{} / {} samples, {} attempts", i + 1, args.count, total_attempts);
        }
    }
    out.flush()?;

    log::info!(
        "Wrote {} samples in {} attempts, next seed {}",
        args.count,
        total_attempts,
        sampler.next_seed
    );
    Ok(())
}

fn evaluate(args: EvaluateArgs) -> Result<(), Error> {
    let kind = statistics_kind(args.stats)?;
    let cfg = load_config(args.config.as_deref())?;
    let params = match &args.params {
        Some(path) => read_json::<TreeParameters>(path)?,
        None => TreeParameters::default(),
    };
    params.validate()?;

    let mut model = TreeModel::new(params, cfg);
    model.reseed(args.seed);
    let plausible = model.generate();
    if !plausible {
        log::warn!("Tree is implausible, its statistics are not meaningful");
    }

    let record = SampleRecord {
        params: model.params_vector(),
        statistics: model.statistics_vector(kind),
    };
    let mut out = io::stdout().lock();
    write_summary(&mut out, &model, plausible)?;
    writeln!(out, "{record}")?;
    Ok(())
}

fn write_summary(out: &mut impl Write, model: &TreeModel, plausible: bool) -> io::Result<()> {
    writeln!(out, "shape: {}", shape_name(model.params.shape))?;
    writeln!(out, "plausible: {plausible}")?;
    writeln!(out, "quads: {}", model.quads().len())
}

fn shape_name(id: u32) -> &'static str {
    Shape::try_from(id).map_or("unknown", Shape::name)
}

fn statistics_kind(id: u32) -> Result<StatisticsKind, Error> {
    StatisticsKind::try_from(id).map_err(Error::UnknownStatistics)
}

fn load_config(path: Option<&Path>) -> Result<Config, Error> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Config::default()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let file = File::open(path)?;
    serde_json::from_reader(io::BufReader::new(file)).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })
}
