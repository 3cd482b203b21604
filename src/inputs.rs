use crate::error::{FilterError, Result};
use crate::{CommitParams, FilterArgs};
use std::path::{Path, PathBuf};

/// Every input of a run as an absolute path. Relative paths given on the command line are taken
/// relative to the subject directory, the process working directory is never changed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterInputs {
    pub subject_dir: PathBuf,
    pub dwi_processed_file: PathBuf,
    pub dwi_scheme_file: PathBuf,
    pub fiber_file: PathBuf,
    pub wm_mask_file: Option<PathBuf>,
    pub connectome_file: PathBuf,
    pub output_dir: PathBuf,
    /// where the dictionary is written and results are saved
    pub dictionary_dir: PathBuf,
    pub reg_lambda: f64,
}

impl FilterInputs {
    pub fn resolve(args: &FilterArgs, params: &CommitParams) -> Result<Self> {
        let subject_dir = std::path::absolute(&args.subject_dir)
            .map_err(|e| FilterError::io(&args.subject_dir, e))?;
        let at_subject = |p: &Path| resolve_path(&subject_dir, p);

        let output_dir = at_subject(&args.output_commit_dir);
        let dictionary_dir = params.dictionary_dir.as_deref()
            .map(|d| at_subject(d))
            .unwrap_or_else(|| output_dir.clone());

        Ok(Self {
            dwi_processed_file: at_subject(&args.dwi_processed_file),
            dwi_scheme_file: at_subject(&args.dwi_scheme_file),
            fiber_file: at_subject(&args.fiber_file),
            wm_mask_file: args.wm_mask_file.as_deref().map(|m| at_subject(m)),
            connectome_file: at_subject(&args.intermediate_connectome_file),
            reg_lambda: args.reg_lambda.unwrap_or(params.reg_lambda),
            output_dir,
            dictionary_dir,
            subject_dir,
        })
    }
}

fn resolve_path(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
