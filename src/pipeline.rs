//! COMMIT followed by COMMIT2 with an anatomical prior on bundles.
//!
//! The connectome is read and checked before any call into COMMIT so malformed input fails
//! before the dictionary and kernels are built.

use crate::backend::{CommitBackend, DictionaryRequest};
use crate::bundle_prior::{group_sizes, group_weights, partition, BundlePrior};
use crate::connectome::read_connectome;
use crate::error::Result;
use crate::inputs::FilterInputs;
use crate::regularisation::Regularisation;
use crate::CommitParams;
use std::time::Instant;

/// suffix of the result set of the unregularized fit
pub const COMMIT1_SUFFIX: &str = "_COMMIT1";
/// suffix of the result set of the fit with the bundle prior
pub const COMMIT2_SUFFIX: &str = "_COMMIT2";

/// what a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub n_groups: usize,
    pub total_streamlines: usize,
    pub n_coefficients: usize,
    pub reg_lambda: f64,
    /// suffixes of the unregularized and the regularized result sets
    pub result_suffixes: [&'static str; 2],
    pub prior: BundlePrior,
}

pub fn run_pipeline<B: CommitBackend + ?Sized>(
    backend: &mut B,
    inputs: &FilterInputs,
    params: &CommitParams,
) -> Result<PipelineReport> {
    let start = Instant::now();

    log::info!("reading connectome {} ...", inputs.connectome_file.display());
    let connectome = read_connectome(&inputs.connectome_file)?;
    let sizes = group_sizes(&connectome)?;
    let blocks = partition(&sizes)?;
    let total_streamlines = blocks.last().map(|b| b.end).unwrap_or(0);
    log::info!("found {} bundles covering {} streamlines", sizes.len(), total_streamlines);
    if sizes.is_empty() {
        log::warn!("connectome has no positive upper-triangular entries, the prior is empty");
    }

    log::info!("building dictionary from {} ...", inputs.fiber_file.display());
    backend.build_dictionary(&DictionaryRequest {
        filename_tractogram: inputs.fiber_file.clone(),
        filename_mask: inputs.wm_mask_file.clone(),
        path_out: inputs.dictionary_dir.clone(),
        fiber_shift: params.fiber_shift,
    })?;

    log::info!("loading data ...");
    backend.load_data(&inputs.dwi_processed_file, &inputs.dwi_scheme_file)?;

    log::info!("setting up forward model ...");
    backend.set_model(&params.model)?;
    backend.generate_kernels(params.regenerate_kernels)?;
    backend.load_kernels()?;

    log::info!("building operator ...");
    backend.load_dictionary(&inputs.dictionary_dir)?;
    backend.set_threads(params.n_threads)?;
    backend.build_operator()?;

    log::info!("fitting without regularisation ...");
    let now = Instant::now();
    backend.fit(&params.fit, None)?;
    log::debug!("fit took {:.03} secs", now.elapsed().as_secs_f32());
    backend.save_results(COMMIT1_SUFFIX)?;

    let x_nnls = backend.coefficients()?;
    log::debug!("retrieved {} streamline coefficients", x_nnls.len());

    log::info!("computing bundle weights ...");
    let weights = group_weights(&sizes, &blocks, &x_nnls, params.epsilon)?;
    let prior = BundlePrior { sizes, blocks, weights };

    log::info!("fitting with bundle prior (lambda = {}) ...", inputs.reg_lambda);
    let regularisation = Regularisation::bundle_prior(&prior, inputs.reg_lambda);
    let now = Instant::now();
    backend.fit(&params.fit, Some(&regularisation))?;
    log::debug!("fit took {:.03} secs", now.elapsed().as_secs_f32());
    backend.save_results(COMMIT2_SUFFIX)?;

    log::info!("done in {:.03} secs", start.elapsed().as_secs_f32());
    Ok(PipelineReport {
        n_groups: prior.n_groups(),
        total_streamlines,
        n_coefficients: x_nnls.len(),
        reg_lambda: inputs.reg_lambda,
        result_suffixes: [COMMIT1_SUFFIX, COMMIT2_SUFFIX],
        prior,
    })
}
