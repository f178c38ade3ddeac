use super::{Dataset, DenseMatrix};
use crate::{memory::*, KMeansError, Result};

/// Sparse matrix in compressed sparse column (CSC) layout.
///
/// Every column is one sample. Only non-zero entries are stored, so inner products and
/// accumulation only touch `nnz` entries per sample instead of `rows`.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix<T: Primitive> {
    rows: usize,
    cols: usize,
    col_ptr: Vec<usize>,
    row_indices: Vec<usize>,
    values: Vec<T>
}
impl<T: Primitive> SparseMatrix<T> {
    /// Build a sparse matrix from `(row, col, value)` triplets.
    /// Triplets may come in any order; duplicate positions are summed up, explicit zeros dropped.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, T)>) -> Result<Self> {
        if let Some(&(r, c, _)) = triplets.iter().find(|&&(r, c, _)| r >= rows || c >= cols) {
            return Err(KMeansError::InvalidData(format!(
                "entry ({}, {}) is out of bounds for a {}x{} matrix", r, c, rows, cols
            )));
        }
        triplets.sort_unstable_by_key(|&(r, c, _)| (c, r));

        let mut col_ptr = vec![0usize; cols + 1];
        let mut row_indices: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;
        for (r, c, v) in triplets {
            if last == Some((r, c)) {
                if let Some(prev) = values.last_mut() {
                    *prev += v;
                }
                continue;
            }
            last = Some((r, c));
            row_indices.push(r);
            values.push(v);
            col_ptr[c + 1] += 1;
        }
        for c in 0..cols {
            col_ptr[c + 1] += col_ptr[c];
        }

        Ok(Self { rows, cols, col_ptr, row_indices, values }.without_zeros())
    }

    /// Sparse copy of a dense matrix.
    pub fn from_dense(dense: &DenseMatrix<T>) -> Self {
        let mut res = Self::empty(dense.rows(), dense.cols());
        for c in 0..dense.cols() {
            for (r, &v) in dense.col(c).iter().enumerate().filter(|(_, v)| !v.is_zero()) {
                res.row_indices.push(r);
                res.values.push(v);
            }
            res.col_ptr[c + 1] = res.values.len();
        }
        res
    }

    fn empty(rows: usize, cols: usize) -> Self {
        Self { rows, cols, col_ptr: vec![0; cols + 1], row_indices: Vec::new(), values: Vec::new() }
    }

    fn without_zeros(self) -> Self {
        if self.values.iter().all(|v| !v.is_zero()) {
            return self;
        }
        let mut res = Self::empty(self.rows, self.cols);
        for c in 0..self.cols {
            let (rows, vals) = self.col(c);
            for (&r, &v) in rows.iter().zip(vals) {
                if !v.is_zero() {
                    res.row_indices.push(r);
                    res.values.push(v);
                }
            }
            res.col_ptr[c + 1] = res.values.len();
        }
        res
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }
    /// Amount of stored (non-zero) entries.
    pub fn nnz(&self) -> usize { self.values.len() }

    /// Row indices and values of the non-zero entries in column `idx`, sorted by row.
    #[inline(always)]
    pub fn col(&self, idx: usize) -> (&[usize], &[T]) {
        let range = self.col_ptr[idx]..self.col_ptr[idx + 1];
        (&self.row_indices[range.clone()], &self.values[range])
    }
}

impl<T: Primitive> Dataset<T> for SparseMatrix<T> {
    fn dims(&self) -> usize { self.rows }
    fn points(&self) -> usize { self.cols }

    #[inline(always)]
    fn dot(&self, col: usize, other: &[T]) -> T {
        let (rows, vals) = self.col(col);
        rows.iter().zip(vals).map(|(&r, &v)| v * other[r]).sum()
    }

    #[inline(always)]
    fn squared_norm(&self, col: usize) -> T {
        self.col(col).1.iter().map(|&v| v * v).sum()
    }

    #[inline(always)]
    fn accumulate(&self, col: usize, acc: &mut [T]) {
        let (rows, vals) = self.col(col);
        rows.iter().zip(vals).for_each(|(&r, v)| acc[r] += v);
    }
}
