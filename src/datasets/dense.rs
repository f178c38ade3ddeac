use super::Dataset;
use crate::{memory::*, KMeansError, Result};

/// Column-major dense matrix.
///
/// Used for dense datasets, where every column is one sample, as well as for centroids,
/// where every column is one cluster center. The buffer layout is
/// `[<column0>,<column1>,<column2>,...]`, so a row-major list of samples can be taken over as is.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix<T: Primitive> {
    rows: usize,
    cols: usize,
    data: Vec<T>
}
impl<T: Primitive> DenseMatrix<T> {
    /// Create a `rows × cols` matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![T::zero(); rows * cols] }
    }

    /// Take over a column-major buffer.
    ///
    /// ## Arguments
    /// - **data**: Buffer of columns [column-major] = [<column0>,<column1>,<column2>,...]
    /// - **rows**: Amount of entries per column (dimensions)
    /// - **cols**: Amount of columns contained in **data**
    pub fn from_columns(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(KMeansError::InvalidData(format!(
                "buffer holds {} values, but a {}x{} matrix needs {}", data.len(), rows, cols, rows * cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }
    pub fn as_slice(&self) -> &[T] { &self.data }

    #[inline(always)]
    pub fn col(&self, idx: usize) -> &[T] {
        &self.data[idx * self.rows..(idx + 1) * self.rows]
    }

    #[inline(always)]
    pub fn col_mut(&mut self, idx: usize) -> &mut [T] {
        &mut self.data[idx * self.rows..(idx + 1) * self.rows]
    }

    /// Resize to `rows × cols` and overwrite every entry with zero. Reuses the allocation where possible.
    pub fn reset(&mut self, rows: usize, cols: usize) {
        self.data.clear();
        self.data.resize(rows * cols, T::zero());
        self.rows = rows;
        self.cols = cols;
    }

    /// Element-wise `self += other`. Both matrices need the same shape.
    pub(crate) fn add_assign(&mut self, other: &DenseMatrix<T>) {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        self.data.iter_mut().zip(other.data.iter()).for_each(|(s, o)| *s += o);
    }
}

#[inline(always)]
pub(crate) fn dot<T: Primitive>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

impl<T: Primitive> Dataset<T> for DenseMatrix<T> {
    fn dims(&self) -> usize { self.rows }
    fn points(&self) -> usize { self.cols }

    #[inline(always)]
    fn dot(&self, col: usize, other: &[T]) -> T {
        dot(self.col(col), other)
    }

    #[inline(always)]
    fn squared_norm(&self, col: usize) -> T {
        let c = self.col(col);
        dot(c, c)
    }

    #[inline(always)]
    fn accumulate(&self, col: usize, acc: &mut [T]) {
        acc.iter_mut().zip(self.col(col)).for_each(|(a, s)| *a += s);
    }
}
