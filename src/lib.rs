pub mod backend;
pub mod bridge;
pub mod bundle_prior;
pub mod coefficients;
pub mod connectome;
pub mod error;
pub mod forward_model;
pub mod inputs;
pub mod pipeline;
pub mod regularisation;

use crate::bridge::PythonBridge;
use crate::bundle_prior::DEFAULT_EPSILON;
use crate::error::{FilterError, Result};
use crate::forward_model::{FitSettings, ForwardModel};
use crate::inputs::FilterInputs;
use crate::pipeline::{run_pipeline, PipelineReport};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Filter a tractogram with COMMIT, then re-fit with COMMIT2 using an anatomical prior on the
/// bundles of the connectome.
#[derive(Debug, Parser)]
#[command(name = "commit-filter")]
pub struct FilterArgs {
    /// preprocessed DWI file
    #[arg(long, alias = "dwiProcessedFile")]
    pub dwi_processed_file: PathBuf,
    /// DWI scheme file
    #[arg(long, alias = "dwiSchemeFile")]
    pub dwi_scheme_file: PathBuf,
    /// input fiber file
    #[arg(long, alias = "fiberFile")]
    pub fiber_file: PathBuf,
    /// output directory for COMMIT
    #[arg(long, alias = "outputCommitDir")]
    pub output_commit_dir: PathBuf,
    /// connectome file with the number of streamlines per connection
    #[arg(long, alias = "intermediateConnectomeFile")]
    pub intermediate_connectome_file: PathBuf,
    /// subject directory, relative paths are resolved against it
    #[arg(long, alias = "subjectDir")]
    pub subject_dir: PathBuf,
    /// white matter mask file
    #[arg(long, alias = "wmMaskFile")]
    pub wm_mask_file: Option<PathBuf>,
    /// regularisation parameter lambda, overrides the parameter file
    #[arg(long, alias = "regLambda")]
    pub reg_lambda: Option<f64>,
    /// path to the parameter file (toml)
    #[arg(long)]
    pub params: Option<PathBuf>,
}

/// Run parameters that are independent of the subject. Missing entries in a parameter file take
/// their default value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CommitParams {
    /// python interpreter with COMMIT installed
    pub python: String,
    /// strength of the group sparsity prior
    pub reg_lambda: f64,
    /// stabilizer of the bundle weights
    pub epsilon: f64,
    pub fiber_shift: f64,
    pub regenerate_kernels: bool,
    /// threads used by COMMIT, unset leaves the choice to COMMIT
    pub n_threads: Option<usize>,
    /// dictionary location, defaults to the output directory
    pub dictionary_dir: Option<PathBuf>,
    pub model: ForwardModel,
    pub fit: FitSettings,
}

impl Default for CommitParams {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            reg_lambda: 5e-4,
            epsilon: DEFAULT_EPSILON,
            fiber_shift: 0.,
            regenerate_kernels: true,
            n_threads: None,
            dictionary_dir: None,
            model: ForwardModel::default(),
            fit: FitSettings::default(),
        }
    }
}

impl CommitParams {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let toml_str = fs::read_to_string(path).map_err(|e| FilterError::io(path, e))?;
        toml::from_str(&toml_str).map_err(|source| FilterError::Params {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        let mut toml_string = toml::to_string(self)?;
        toml_string.push('\n');
        Ok(toml_string)
    }

    /// the parameter file named on the command line, or the defaults
    pub fn for_args(args: &FilterArgs) -> Result<Self> {
        match &args.params {
            Some(p) => Self::from_file(p.with_extension("toml")),
            None => Ok(Self::default()),
        }
    }
}

/// runs the whole filter for one subject against the python COMMIT installation
pub fn commit_filter_exec(args: &FilterArgs, params: &CommitParams) -> Result<PipelineReport> {
    let inputs = FilterInputs::resolve(args, params)?;
    log::debug!("{:#?}", inputs);

    fs::create_dir_all(&inputs.output_dir).map_err(|e| FilterError::io(&inputs.output_dir, e))?;

    let mut bridge = PythonBridge::spawn(&params.python, &inputs.subject_dir, &inputs.output_dir)?;
    let report = run_pipeline(&mut bridge, &inputs, params)?;
    bridge.shutdown()?;
    Ok(report)
}
