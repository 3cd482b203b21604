use clap::Parser;
use commit_filter::{commit_filter_exec, CommitParams, FilterArgs};
use env_logger::Env;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = FilterArgs::parse();

    let result = CommitParams::for_args(&args)
        .and_then(|params| commit_filter_exec(&args, &params));
    match result {
        Ok(report) => {
            log::info!(
                "{} streamline coefficients, {} bundles over {} streamlines, \
                 results saved with suffixes {} and {}",
                report.n_coefficients,
                report.n_groups,
                report.total_streamlines,
                report.result_suffixes[0],
                report.result_suffixes[1],
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
