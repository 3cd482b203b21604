//! The boundary to the COMMIT library.
//!
//! Dictionary construction, kernel generation and the solvers all live in COMMIT. The pipeline
//! only drives them through [CommitBackend], which mirrors the library calls one to one. The
//! production implementation is [crate::bridge::PythonBridge].

use crate::error::Result;
use crate::forward_model::{FitSettings, ForwardModel};
use crate::regularisation::Regularisation;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// parameters of the tractogram to dictionary conversion
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DictionaryRequest {
    pub filename_tractogram: PathBuf,
    /// restrict the dictionary to voxels inside this mask
    pub filename_mask: Option<PathBuf>,
    pub path_out: PathBuf,
    pub fiber_shift: f64,
}

pub trait CommitBackend {
    fn build_dictionary(&mut self, request: &DictionaryRequest) -> Result<()>;

    fn load_data(&mut self, dwi_filename: &Path, scheme_filename: &Path) -> Result<()>;

    fn set_model(&mut self, model: &ForwardModel) -> Result<()>;

    fn generate_kernels(&mut self, regenerate: bool) -> Result<()>;

    fn load_kernels(&mut self) -> Result<()>;

    fn load_dictionary(&mut self, path: &Path) -> Result<()>;

    /// `None` leaves the thread count to the library
    fn set_threads(&mut self, n_threads: Option<usize>) -> Result<()>;

    fn build_operator(&mut self) -> Result<()>;

    /// unregularized fit when `regularisation` is `None`
    fn fit(
        &mut self,
        settings: &FitSettings,
        regularisation: Option<&Regularisation>,
    ) -> Result<()>;

    fn save_results(&mut self, path_suffix: &str) -> Result<()>;

    /// raw (not normalized) streamline coefficients of the last fit
    fn coefficients(&mut self) -> Result<Vec<f64>>;
}
