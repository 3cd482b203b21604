use commit_filter::bundle_prior::{group_sizes, BundlePrior, DEFAULT_EPSILON};
use commit_filter::connectome::parse_connectome;
use commit_filter::error::FilterError;
use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

fn norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn random_coefficients(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(0.0..1.0)).collect()
}

#[test]
fn zero_connectome_has_no_groups() {
    let c = Array2::<f64>::zeros((4, 4));
    let prior = BundlePrior::from_connectome(&c, &[], DEFAULT_EPSILON).unwrap();
    assert!(prior.blocks.is_empty());
    assert!(prior.weights.is_empty());
    assert_eq!(prior.total_streamlines(), 0);
}

#[test]
fn single_bundle() {
    let s = 7;
    let mut c = Array2::<f64>::zeros((3, 3));
    c[[1, 2]] = s as f64;
    let x = random_coefficients(s, 1);

    let prior = BundlePrior::from_connectome(&c, &x, DEFAULT_EPSILON).unwrap();
    assert_eq!(prior.sizes, vec![s]);
    assert_eq!(prior.blocks, vec![0..s]);
    let expected = (s as f64).sqrt() / (norm(&x) + DEFAULT_EPSILON);
    assert!((prior.weights[0] - expected).abs() <= 1e-12 * expected);
}

#[test]
fn symmetric_duplicates_are_ignored() {
    let c = array![[0., 3., 2.], [3., 0., 0.], [2., 0., 0.]];
    let x = [1., 2., 2., 0., 5.];
    let prior = BundlePrior::from_connectome(&c, &x, DEFAULT_EPSILON).unwrap();
    assert_eq!(prior.sizes, vec![3, 2]);
    assert_eq!(prior.blocks, vec![0..3, 3..5]);
    assert!((prior.weights[0] - 3f64.sqrt() / (3. + DEFAULT_EPSILON)).abs() < 1e-12);
    assert!((prior.weights[1] - 2f64.sqrt() / (5. + DEFAULT_EPSILON)).abs() < 1e-12);
}

#[test]
fn diagonal_entries_are_bundles() {
    let c = array![[2., 0.], [1., 4.]];
    assert_eq!(group_sizes(&c).unwrap(), vec![2, 4]);
}

#[test]
fn sizes_must_cover_coefficients() {
    let c = array![[0., 3., 2.], [3., 0., 0.], [2., 0., 0.]];
    for n in [4, 6] {
        let x = random_coefficients(n, 2);
        match BundlePrior::from_connectome(&c, &x, DEFAULT_EPSILON) {
            Err(FilterError::GroupSizeMismatch { expected, found }) => {
                assert_eq!(expected, 5);
                assert_eq!(found, n);
            }
            other => panic!("expected GroupSizeMismatch, got {:?}", other),
        }
    }
}

#[test]
fn blocks_partition_all_streamlines() {
    let n_regions = 12;
    let mut rng = StdRng::seed_from_u64(3);
    let mut c = Array2::<f64>::zeros((n_regions, n_regions));
    for i in 0..n_regions {
        for j in i..n_regions {
            if rng.random_bool(0.4) {
                let count = rng.random_range(1..50) as f64;
                c[[i, j]] = count;
                c[[j, i]] = count;
            }
        }
    }
    let total = group_sizes(&c).unwrap().iter().sum::<usize>();
    let x = random_coefficients(total, 4);

    let prior = BundlePrior::from_connectome(&c, &x, DEFAULT_EPSILON).unwrap();
    assert_eq!(prior.total_streamlines(), x.len());
    let mut next = 0;
    for (block, &size) in prior.blocks.iter().zip(&prior.sizes) {
        assert_eq!(block.start, next);
        assert_eq!(block.len(), size);
        next = block.end;
    }
    assert_eq!(next, total);
}

#[test]
fn epsilon_is_negligible_for_active_bundles() {
    let c = array![[0., 40.], [0., 25.]];
    let x = random_coefficients(65, 5);
    let a = BundlePrior::from_connectome(&c, &x, 1e-12).unwrap();
    let b = BundlePrior::from_connectome(&c, &x, 1e-9).unwrap();
    for (wa, wb) in a.weights.iter().zip(&b.weights) {
        assert!((wa - wb).abs() <= 1e-6 * wa);
    }
}

#[test]
fn silent_bundle_gets_large_finite_weight() {
    let c = array![[0., 2., 3.], [0., 0., 0.], [0., 0., 0.]];
    let x = [0., 0., 0.5, 0.5, 0.5];
    let prior = BundlePrior::from_connectome(&c, &x, DEFAULT_EPSILON).unwrap();
    assert!(prior.weights[0].is_finite());
    assert!(prior.weights[0] > 1e11);
    assert!(prior.weights[1] < 10.);
}

#[test]
fn from_csv_text() {
    let c = parse_connectome("0,3,2\n3,0,0\n2,0,0\n".as_bytes(), Path::new("c.csv")).unwrap();
    let prior = BundlePrior::from_connectome(&c, &[1.; 5], DEFAULT_EPSILON).unwrap();
    assert_eq!(prior.n_groups(), 2);
}
