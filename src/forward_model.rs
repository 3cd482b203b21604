// Forward model and solver settings handed to COMMIT
// the defaults reproduce the acquisition-independent constants of the CATO structural pipeline

use serde::{Deserialize, Serialize};

/// StickZeppelinBall forward model: one stick per streamline for the intra-cellular
/// compartment, optional zeppelins for the extra-cellular compartment and balls for the
/// isotropic compartment. Diffusivities are in mm^2/s.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForwardModel {
    /// parallel diffusivity
    pub d_par: f64,
    /// perpendicular diffusivities of the zeppelins, empty for no extra-cellular compartment
    pub d_perps_zep: Vec<f64>,
    /// isotropic diffusivities
    pub d_isos: Vec<f64>,
}

impl ForwardModel {
    pub const NAME: &'static str = "StickZeppelinBall";
}

impl Default for ForwardModel {
    fn default() -> Self {
        Self {
            d_par: 1.7E-3,
            d_perps_zep: vec![],
            d_isos: vec![1.7E-3, 3.0E-3],
        }
    }
}

/// stopping criteria for both COMMIT fits
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct FitSettings {
    pub tol_fun: f64,
    pub max_iter: usize,
    pub verbose: bool,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            tol_fun: 1e-3,
            max_iter: 1000,
            verbose: false,
        }
    }
}
