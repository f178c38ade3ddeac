mod dense;
mod sparse;

pub use dense::DenseMatrix;
pub use sparse::SparseMatrix;

use crate::memory::Primitive;

/// Read-only `dims × points` sample storage, as consumed by [`IterationEngine`](crate::IterationEngine).
///
/// Each sample is one column. Implementors only have to provide column-wise access against
/// dense vectors, which is all the Lloyd step needs, so both dense and sparse layouts fit.
pub trait Dataset<T: Primitive>: Sync {
    /// Amount of dimensions (rows) of every sample.
    fn dims(&self) -> usize;
    /// Amount of samples (columns).
    fn points(&self) -> usize;
    /// Inner product of sample `col` with the dense vector `other` (`other.len() == dims`).
    fn dot(&self, col: usize, other: &[T]) -> T;
    /// Squared euclidean norm of sample `col`.
    fn squared_norm(&self, col: usize) -> T;
    /// Add sample `col` onto the dense accumulator `acc` (`acc.len() == dims`).
    fn accumulate(&self, col: usize, acc: &mut [T]);
}
