use super::{DistanceFunction, SquaredEuclidean};
use crate::Primitive;

/// Squared euclidean distance `Σ (a_i - b_i)²`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EuclideanDistance;

impl<T: Primitive> DistanceFunction<T> for EuclideanDistance {
    #[inline(always)]
    fn distance(&self, a: &[T], b: &[T]) -> T {
        a.iter().zip(b.iter())
            .map(|(&sp, &cp)| sp - cp)      // <sample> - <centroid>
            .map(|v| v * v)                 // <vec_components> ^2
            .sum()                          // sum(<vec_components>^2)
    }
}
impl<T: Primitive> SquaredEuclidean<T> for EuclideanDistance {}
