use crate::{datasets::{Dataset, DenseMatrix}, distances::SquaredEuclidean, helpers, memory::*};
use log::{debug, trace};
use rayon::prelude::*;
use std::{ops::Range, sync::{Mutex, PoisonError}};

/// One naive Lloyd step: assign every sample to its nearest centroid, then move every centroid
/// into the mean of its samples.
pub(crate) struct Lloyd<T> where T: Primitive {
	_p: std::marker::PhantomData<T>
}
impl<T> Lloyd<T> where T: Primitive {
    fn centroid_norms(centroids: &DenseMatrix<T>) -> Vec<T> {
        (0..centroids.cols()).into_par_iter()
            .map(|j| centroids.squared_norm(j))
            .collect()
    }

    /// Nearest centroid of sample `idx`, together with its squared distance, computed as
    /// `‖s‖² + ‖c‖² - 2·s·c`. Ties resolve to the lower centroid index.
    #[inline(always)]
    pub(crate) fn nearest_centroid<M: Dataset<T>>(data: &M, idx: usize, centroids: &DenseMatrix<T>, centroid_norms: &[T]) -> (usize, T) {
        let two = T::one() + T::one();
        let data_norm = data.squared_norm(idx);
        let distance_to = |j: usize| data_norm + centroid_norms[j] - two * data.dot(idx, centroids.col(j));

        let (mut closest, mut min_distance) = (0, distance_to(0));
        for j in 1..centroids.cols() {
            let dist = distance_to(j);
            if dist < min_distance {
                min_distance = dist;
                closest = j;
            }
        }
        (closest, min_distance)
    }

    /// Per-worker pass over `segment`, summing each sample into a private accumulator column of its cluster.
    fn assign_segment<M: Dataset<T>>(data: &M, centroids: &DenseMatrix<T>, centroid_norms: &[T], segment: Range<usize>) -> (DenseMatrix<T>, Vec<usize>) {
        let mut local_centroids = DenseMatrix::zeros(centroids.rows(), centroids.cols());
        let mut local_counts = vec![0usize; centroids.cols()];
        for i in segment {
            let (closest, _) = Self::nearest_centroid(data, i, centroids, centroid_norms);
            data.accumulate(i, local_centroids.col_mut(closest));
            local_counts[closest] += 1;
        }
        (local_centroids, local_counts)
    }

    /// Run the step with `workers` parallel workers. **centroids** has to be non-empty and match
    /// the dataset's dimensions. Returns the summed euclidean movement of all centroids.
    pub fn calculate<M, D>(data: &M, distance: &D, centroids: &DenseMatrix<T>,
                new_centroids: &mut DenseMatrix<T>, counts: &mut Vec<usize>, workers: usize) -> T
                where M: Dataset<T>, D: SquaredEuclidean<T> {
        let (dims, k, points) = (centroids.rows(), centroids.cols(), data.points());
        debug_assert!(k > 0 && dims == data.dims() && workers > 0);

        new_centroids.reset(dims, k);
        counts.clear();
        counts.resize(k, 0);

        let centroid_norms = Self::centroid_norms(centroids);

        // Workers only synchronize once, when merging their accumulators into the shared result
        let merged = Mutex::new((&mut *new_centroids, &mut *counts));
        rayon::scope(|s| {
            for (worker, segment) in helpers::segments(points, workers).enumerate() {
                let (merged, centroid_norms) = (&merged, &centroid_norms);
                s.spawn(move |_| {
                    let segment_len = segment.len();
                    let (local_centroids, local_counts) = Self::assign_segment(data, centroids, centroid_norms, segment);

                    let mut guard = merged.lock().unwrap_or_else(PoisonError::into_inner);
                    let (shared_centroids, shared_counts) = &mut *guard;
                    shared_centroids.add_assign(&local_centroids);
                    shared_counts.iter_mut().zip(local_counts).for_each(|(s, l)| *s += l);
                    trace!("worker {} merged {} samples", worker, segment_len);
                });
            }
        });
        drop(merged);

        // Sums -> means. Empty clusters stay at the origin.
        let mut empty_clusters = 0;
        for (j, &cnt) in counts.iter().enumerate() {
            if cnt == 0 {
                empty_clusters += 1;
                continue;
            }
            let cnt = from_count::<T>(cnt);
            new_centroids.col_mut(j).iter_mut().for_each(|v| *v /= cnt);
        }
        if empty_clusters > 0 {
            debug!("{} of {} clusters received no samples", empty_clusters, k);
        }

        let new_centroids: &DenseMatrix<T> = new_centroids;
        (0..k).into_par_iter()
            .map(|j| distance.distance(centroids.col(j), new_centroids.col(j)).sqrt())
            .sum()
    }
}
