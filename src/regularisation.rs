use crate::bundle_prior::BundlePrior;
use serde::{Deserialize, Serialize};

/// penalty applied to one compartment of the COMMIT solution
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegNorm {
    NonNegative,
    GroupSparsity,
}

/// Regularisation for the COMMIT2 fit, one entry per compartment in the order
/// intra-cellular, extra-cellular, isotropic. Only the intra-cellular compartment carries a
/// group structure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Regularisation {
    pub regnorms: [RegNorm; 3],
    /// half-open [start, end) streamline index range of every group
    #[serde(rename = "structureIC")]
    pub structure_ic: Vec<[usize; 2]>,
    #[serde(rename = "weightsIC")]
    pub weights_ic: Vec<f64>,
    pub lambdas: [f64; 3],
}

impl Regularisation {
    /// group sparsity on the streamline weights, plain non-negativity on the other compartments
    pub fn bundle_prior(prior: &BundlePrior, reg_lambda: f64) -> Self {
        Self {
            regnorms: [RegNorm::GroupSparsity, RegNorm::NonNegative, RegNorm::NonNegative],
            structure_ic: prior.blocks.iter().map(|b| [b.start, b.end]).collect(),
            weights_ic: prior.weights.clone(),
            lambdas: [reg_lambda, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let prior = BundlePrior {
            sizes: vec![3, 2],
            blocks: vec![0..3, 3..5],
            weights: vec![0.5, 0.25],
        };
        let reg = Regularisation::bundle_prior(&prior, 5e-4);
        let v = serde_json::to_value(&reg).unwrap();
        assert_eq!(
            v["regnorms"],
            serde_json::json!(["group_sparsity", "non_negative", "non_negative"])
        );
        assert_eq!(v["structureIC"], serde_json::json!([[0, 3], [3, 5]]));
        assert_eq!(v["weightsIC"], serde_json::json!([0.5, 0.25]));
        assert_eq!(v["lambdas"], serde_json::json!([5e-4, 0.0, 0.0]));
    }
}
