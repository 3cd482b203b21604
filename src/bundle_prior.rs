//! Anatomical prior on bundles.
//!
//! Every strictly positive entry in the upper triangle of the connectome is one bundle, and the
//! bundle's streamlines are assumed to sit contiguously in the dictionary, in row-major order of
//! the connectome entries. The prior turns that layout and the unregularized COMMIT coefficients
//! into the group structure and group weights consumed by the group-sparsity regularizer.

use crate::error::{FilterError, Result};
use csv::WriterBuilder;
use ndarray::{Array2, ArrayView1};
use serde::Serialize;
use std::io::Write;
use std::ops::Range;

/// stabilizer added to each group norm so empty or all-zero bundles produce finite weights
pub const DEFAULT_EPSILON: f64 = 1e-12;

/// Group structure and weights for the COMMIT2 bundle prior. Blocks appear in row-major order
/// of the positive upper-triangular connectome entries, which must match the streamline order
/// of the dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct BundlePrior {
    pub sizes: Vec<usize>,
    pub blocks: Vec<Range<usize>>,
    pub weights: Vec<f64>,
}

impl BundlePrior {
    /// derives the groups from the connectome and weights them with the coefficients `x`. The sum
    /// of the bundle sizes must equal the length of `x`.
    pub fn from_connectome(connectome: &Array2<f64>, x: &[f64], eps: f64) -> Result<Self> {
        let sizes = group_sizes(connectome)?;
        let blocks = partition(&sizes)?;
        let weights = group_weights(&sizes, &blocks, x, eps)?;
        Ok(Self {
            sizes,
            blocks,
            weights,
        })
    }

    pub fn n_groups(&self) -> usize {
        self.sizes.len()
    }

    pub fn total_streamlines(&self) -> usize {
        self.blocks.last().map(|b| b.end).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

#[derive(Serialize)]
struct GroupRow {
    group: usize,
    start: usize,
    end: usize,
    size: usize,
    weight: f64,
}

/// writes one csv row per group: `group,start,end,size,weight`
pub fn write_group_table<W: Write>(prior: &BundlePrior, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    let rows = prior.sizes.iter().zip(&prior.blocks).zip(&prior.weights);
    for (group, ((&size, block), &weight)) in rows.enumerate() {
        wtr.serialize(GroupRow {
            group,
            start: block.start,
            end: block.end,
            size,
            weight,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// returns a copy of the matrix with all entries strictly below the diagonal set to zero
pub fn upper_triangle(c: &Array2<f64>) -> Array2<f64> {
    let mut u = c.clone();
    u.indexed_iter_mut().for_each(|((i, j), v)| {
        if j < i {
            *v = 0.;
        }
    });
    u
}

/// the streamline count of every bundle: strictly positive upper-triangular entries read in
/// row-major order. Positive entries must be finite whole numbers.
pub fn group_sizes(connectome: &Array2<f64>) -> Result<Vec<usize>> {
    let (rows, cols) = connectome.dim();
    if rows != cols {
        return Err(FilterError::NotSquare { rows, cols });
    }
    let u = upper_triangle(connectome);

    let mut sizes = Vec::new();
    for ((row, col), &value) in u.indexed_iter() {
        // NaN and non-positive entries are not bundles
        if !(value > 0.) {
            continue;
        }
        if !value.is_finite() || value.fract() != 0. || value >= usize::MAX as f64 {
            return Err(FilterError::InvalidCount { row, col, value });
        }
        sizes.push(value as usize);
    }
    Ok(sizes)
}

/// splits [0, sum(sizes)) into contiguous blocks, one per group
pub fn partition(sizes: &[usize]) -> Result<Vec<Range<usize>>> {
    let mut offset = 0usize;
    sizes.iter().map(|&s| {
        let end = offset.checked_add(s).ok_or(FilterError::TooManyStreamlines)?;
        let block = offset..end;
        offset = end;
        Ok(block)
    }).collect()
}

fn checked_total(sizes: &[usize]) -> Result<usize> {
    sizes.iter()
        .try_fold(0usize, |acc, &s| acc.checked_add(s))
        .ok_or(FilterError::TooManyStreamlines)
}

/// w_i = sqrt(s_i) / (||x[block_i]||_2 + eps)
pub fn group_weights(
    sizes: &[usize],
    blocks: &[Range<usize>],
    x: &[f64],
    eps: f64,
) -> Result<Vec<f64>> {
    if sizes.len() != blocks.len() {
        return Err(FilterError::BlockCount {
            groups: sizes.len(),
            blocks: blocks.len(),
        });
    }
    let expected = checked_total(sizes)?;
    if expected != x.len() {
        return Err(FilterError::GroupSizeMismatch {
            expected,
            found: x.len(),
        });
    }

    sizes.iter().zip(blocks).enumerate().map(|(group, (&s, block))| {
        let sub = x.get(block.clone())
            .filter(|sub| sub.len() == s)
            .ok_or_else(|| FilterError::InvalidBlock {
                group,
                start: block.start,
                end: block.end,
                size: s,
                len: x.len(),
            })?;
        let sub = ArrayView1::from(sub);
        Ok((s as f64).sqrt() / (sub.dot(&sub).sqrt() + eps))
    }).collect()
}
