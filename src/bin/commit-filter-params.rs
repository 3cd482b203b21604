use clap::Parser;
use commit_filter::error::FilterError;
use commit_filter::CommitParams;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
struct Args {
    /// path to parameter file to write
    parameter_file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filename = args.parameter_file.with_extension("toml");
    let result = CommitParams::default().to_toml().and_then(|toml_string| {
        File::create(&filename)
            .and_then(|mut f| f.write_all(toml_string.as_bytes()))
            .map_err(|e| FilterError::Io { path: filename.clone(), source: e })
    });
    match result {
        Ok(()) => {
            println!("wrote default parameter file to {}", filename.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
