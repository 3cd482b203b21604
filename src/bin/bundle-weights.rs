use clap::Parser;
use commit_filter::bundle_prior::{write_group_table, BundlePrior, DEFAULT_EPSILON};
use commit_filter::coefficients::read_coefficients;
use commit_filter::connectome::read_connectome;
use commit_filter::error::{FilterError, Result};
use env_logger::Env;
use std::fs::File;
use std::io::{stdout, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

/// Compute the bundle groups and weights of the COMMIT2 prior from a connectome and a set of
/// streamline coefficients, without running COMMIT.
#[derive(Debug, Parser)]
struct Args {
    /// comma-delimited connectome with streamline counts
    connectome: PathBuf,
    /// streamline coefficients, raw little-endian f64 (.f64) or text
    coefficients: PathBuf,
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f64,
    /// csv file to write, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run(args: &Args) -> Result<()> {
    let connectome = read_connectome(&args.connectome)?;
    let x = read_coefficients(&args.coefficients)?;
    let prior = BundlePrior::from_connectome(&connectome, &x, args.epsilon)?;
    log::info!("{} bundles covering {} streamlines", prior.n_groups(), prior.total_streamlines());

    match &args.output {
        Some(path) => {
            let f = File::create(path).map_err(|source| FilterError::Io {
                path: path.clone(),
                source,
            })?;
            write_group_table(&prior, BufWriter::new(f))
        }
        None => write_group_table(&prior, stdout().lock()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    match run(&Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
