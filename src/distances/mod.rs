mod euclideandistance;

pub use euclideandistance::EuclideanDistance;

use crate::memory::Primitive;

/// Distance between two dense samples of equal length.
pub trait DistanceFunction<T: Primitive>: Sync {
    fn distance(&self, a: &[T], b: &[T]) -> T;
}

/// Marker for distance functions that compute the squared euclidean distance.
///
/// [`IterationEngine`](crate::IterationEngine) only accepts these, because it never calls
/// [`DistanceFunction::distance`] in its hot loop, but expands `‖a - b‖² = ‖a‖² + ‖b‖² - 2·a·b` instead.
pub trait SquaredEuclidean<T: Primitive>: DistanceFunction<T> {}
