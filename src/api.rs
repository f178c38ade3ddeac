use crate::{datasets::{Dataset, DenseMatrix}, distances::SquaredEuclidean, helpers, memory::*, KMeansError, Result};
use log::debug;

pub type IterationDoneCallbackFn<'a, T> = &'a dyn Fn(&[usize], T);

/// This is a structure holding the configuration options of an [`IterationEngine`], such as
/// the amount of parallel workers to use, or a callback that can be set to get status information
/// after every iteration.
///
/// For a more detailed information about all possible options, have a look at [`IterationConfigBuilder`].
pub struct IterationConfig<'a, T: Primitive> {
    /// Minimum amount of samples a worker has to process, before another worker is used
    pub(crate) min_points_per_worker: usize,
    /// Upper limit of parallel workers (`None`: size of rayon's current thread-pool)
    pub(crate) max_workers: Option<usize>,
    /// Callback that is called after each iteration
    /// ## Arguments
    /// - **counts**: Amount of samples assigned to each cluster
    /// - **shift**: Summed movement of all centroids
    pub(crate) iteration_done: IterationDoneCallbackFn<'a, T>
}
impl<'a, T: Primitive> Default for IterationConfig<'a, T> {
    fn default() -> Self {
        Self {
            min_points_per_worker: 100,
            max_workers: None,
            iteration_done: &|_,_| {}
        }
    }
}
impl<'a, T: Primitive> IterationConfig<'a, T> {
    /// Use the [`IterationConfigBuilder`] to build a [`IterationConfig`] instance.
    pub fn build() -> IterationConfigBuilder<'a, T> {
        IterationConfigBuilder { config: IterationConfig::default() }
    }

    pub fn min_points_per_worker(&self) -> usize { self.min_points_per_worker }

    /// Effective upper limit of parallel workers.
    pub fn max_workers(&self) -> usize {
        self.max_workers.unwrap_or_else(rayon::current_num_threads)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_points_per_worker == 0 {
            return Err(KMeansError::InvalidConfig("min_points_per_worker must be > 0".into()));
        }
        if self.max_workers == Some(0) {
            return Err(KMeansError::InvalidConfig("max_workers must be > 0".into()));
        }
        Ok(())
    }
}
impl<'a, T: Primitive> std::fmt::Debug for IterationConfig<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationConfig")
            .field("min_points_per_worker", &self.min_points_per_worker)
            .field("max_workers", &self.max_workers)
            .finish()
    }
}

pub struct IterationConfigBuilder<'a, T: Primitive> {
    config: IterationConfig<'a, T>
}
impl<'a, T: Primitive> IterationConfigBuilder<'a, T> {
    /// Set the minimum amount of samples per worker. Fewer workers are used, when there are not
    /// enough samples to give each of them this many.
    /// ## Default
    /// `100`
    pub fn min_points_per_worker(mut self, min_points_per_worker: usize) -> Self {
        self.config.min_points_per_worker = min_points_per_worker; self
    }
    /// Set the upper limit of parallel workers.
    /// ## Default
    /// The size of rayon's current thread-pool ([`rayon::current_num_threads`])
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.config.max_workers = Some(max_workers); self
    }
    /// Set the callback that should be called after each successful iteration.
    pub fn iteration_done(mut self, iteration_done: IterationDoneCallbackFn<'a, T>) -> Self {
        self.config.iteration_done = iteration_done; self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> IterationConfig<'a, T> { self.config }
}


/// Owned result of a single iteration, as returned by [`IterationEngine::step`].
///
/// ## Fields
/// - **centroids**: Updated cluster centers, one per column (`dims × clusters`)
/// - **counts**: Amount of samples assigned to each cluster
/// - **shift**: Sum over all clusters of the euclidean distance between old and new centroid
#[derive(Clone, Debug, PartialEq)]
pub struct IterationState<T: Primitive> {
    pub centroids: DenseMatrix<T>,
    pub counts: Vec<usize>,
    pub shift: T
}


/// Entrypoint of this crate's API-Surface.
///
/// Binds to a dataset and a squared-euclidean distance function (both borrowed, both read-only)
/// and runs single Lloyd iterations on them. The outer loop (initialization, convergence checks,
/// handling of empty clusters) is left to the caller.
///
/// ## Numerics
/// Distances are computed as `‖s‖² + ‖c‖² - 2·s·c` with cached centroid norms. This is exact
/// in exact arithmetic, but suffers from cancellation when samples and centroids are far from
/// the origin compared to their distance. Compared to the literal `Σ (s_i - c_i)²`, results can
/// differ in the last bits, which can flip assignments of samples (nearly) equidistant to two centroids.
///
/// ## Example
/// ```rust
/// use naive_kmeans::*;
///
/// let samples = DenseMatrix::from_columns(vec![0.0f64, 0.0, 0.0, 1.0, 10.0, 0.0, 10.0, 1.0], 2, 4).unwrap();
/// let centroids = DenseMatrix::from_columns(vec![0.0, 0.0, 10.0, 0.0], 2, 2).unwrap();
///
/// let mut engine = IterationEngine::new(&samples, &EuclideanDistance);
/// let (mut new_centroids, mut counts) = (DenseMatrix::zeros(0, 0), Vec::new());
/// let shift = engine.iterate(&centroids, &mut new_centroids, &mut counts).unwrap();
///
/// assert_eq!(counts, vec![2, 2]);
/// assert_eq!(new_centroids.as_slice(), &[0.0, 0.5, 10.0, 0.5]);
/// assert_eq!(shift, 1.0);
/// assert_eq!(engine.distance_calculations(), 8);
/// ```
pub struct IterationEngine<'a, T, M, D> where T: Primitive, M: Dataset<T>, D: SquaredEuclidean<T> {
    dataset: &'a M,
    distance: &'a D,
    config: IterationConfig<'a, T>,
    distance_calculations: usize
}
impl<'a, T, M, D> IterationEngine<'a, T, M, D> where T: Primitive, M: Dataset<T>, D: SquaredEuclidean<T> {
    /// Create a new engine with the default [`IterationConfig`].
    ///
    /// ## Arguments
    /// - **dataset**: Samples to cluster, one per column
    /// - **distance**: Distance function, has to compute the squared euclidean distance
    pub fn new(dataset: &'a M, distance: &'a D) -> Self {
        Self { dataset, distance, config: IterationConfig::default(), distance_calculations: 0 }
    }

    /// Create a new engine with a custom configuration.
    /// Fails with [`KMeansError::InvalidConfig`] if the configuration is unusable.
    pub fn with_config(dataset: &'a M, distance: &'a D, config: IterationConfig<'a, T>) -> Result<Self> {
        config.validate()?;
        Ok(Self { dataset, distance, config, distance_calculations: 0 })
    }

    pub fn dataset(&self) -> &'a M { self.dataset }
    pub fn distance(&self) -> &'a D { self.distance }
    pub fn config(&self) -> &IterationConfig<'a, T> { &self.config }

    /// Total amount of sample-centroid distances evaluated by all iterations of this engine.
    pub fn distance_calculations(&self) -> usize { self.distance_calculations }

    /// Amount of parallel workers an iteration on this engine's dataset uses.
    pub fn worker_count(&self) -> usize {
        helpers::worker_count(self.config.max_workers(), self.dataset.points(), self.config.min_points_per_worker)
    }

    /// Run a single Lloyd iteration.
    ///
    /// Every sample is assigned to its nearest centroid (ties go to the lower cluster index),
    /// then every centroid is replaced by the mean of its assigned samples. Clusters without
    /// samples become the zero vector.
    ///
    /// ## Arguments
    /// - **centroids**: Current cluster centers, one per column (`dims × clusters`)
    /// - **new_centroids**: Receives the updated cluster centers (resized to `dims × clusters`)
    /// - **counts**: Receives the amount of samples per cluster (resized to `clusters`)
    ///
    /// ## Returns
    /// The sum over all clusters of the euclidean distance between old and new centroid.
    /// Fails with [`KMeansError::NoClusters`] or [`KMeansError::DimensionMismatch`] without
    /// touching the outputs.
    pub fn iterate(&mut self, centroids: &DenseMatrix<T>, new_centroids: &mut DenseMatrix<T>, counts: &mut Vec<usize>) -> Result<T> {
        let (dims, points, clusters) = (self.dataset.dims(), self.dataset.points(), centroids.cols());
        if clusters == 0 {
            return Err(KMeansError::NoClusters);
        }
        if centroids.rows() != dims {
            return Err(KMeansError::DimensionMismatch { dataset: dims, centroids: centroids.rows() });
        }

        let workers = self.worker_count();
        debug!("iterating over {} samples ({} dims) and {} clusters using {} workers of ~{} samples",
            points, dims, clusters, workers, points / workers);

        let shift = crate::variants::Lloyd::calculate(self.dataset, self.distance, centroids, new_centroids, counts, workers);
        self.distance_calculations += clusters * points;

        debug!("iteration done, shift: {:e}", shift);
        (self.config.iteration_done)(counts.as_slice(), shift);
        Ok(shift)
    }

    /// Like [`IterationEngine::iterate`], but allocates and returns the outputs.
    pub fn step(&mut self, centroids: &DenseMatrix<T>) -> Result<IterationState<T>> {
        let mut new_centroids = DenseMatrix::zeros(centroids.rows(), centroids.cols());
        let mut counts = Vec::with_capacity(centroids.cols());
        let shift = self.iterate(centroids, &mut new_centroids, &mut counts)?;
        Ok(IterationState { centroids: new_centroids, counts, shift })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{helpers::testing::*, EuclideanDistance, SparseMatrix};
    use rand::prelude::*;
    use std::cell::{Cell, RefCell};

    fn four_points() -> (DenseMatrix<f64>, DenseMatrix<f64>) {
        let samples = DenseMatrix::from_columns(vec![0.0, 0.0, 0.0, 1.0, 10.0, 0.0, 10.0, 1.0], 2, 4).unwrap();
        let centroids = DenseMatrix::from_columns(vec![0.0, 0.0, 10.0, 0.0], 2, 2).unwrap();
        (samples, centroids)
    }

    #[test]
    fn four_points_two_clusters() {
        let (samples, centroids) = four_points();
        let mut engine = IterationEngine::new(&samples, &EuclideanDistance);
        let (mut new_centroids, mut counts) = (DenseMatrix::zeros(0, 0), Vec::new());
        let shift = engine.iterate(&centroids, &mut new_centroids, &mut counts).unwrap();

        assert_eq!(counts, vec![2, 2]);
        assert_eq!(new_centroids, DenseMatrix::from_columns(vec![0.0, 0.5, 10.0, 0.5], 2, 2).unwrap());
        assert_approx_eq!(shift, 1.0);
        assert_eq!(engine.distance_calculations(), 8);

        // converged: feeding the result back does not move anything
        let state = engine.step(&new_centroids).unwrap();
        assert_eq!(state.centroids, new_centroids);
        assert_eq!(state.counts, vec![2, 2]);
        assert_eq!(state.shift, 0.0);
        assert_eq!(engine.distance_calculations(), 16);
    }

    #[test]
    fn empty_cluster_becomes_zero_vector() {
        let (samples, _) = four_points();
        let centroids = DenseMatrix::from_columns(vec![0.0, 0.5, 1337.0, 42.0, 10.0, 0.5], 2, 3).unwrap();
        let mut engine = IterationEngine::new(&samples, &EuclideanDistance);
        let state = engine.step(&centroids).unwrap();

        assert_eq!(state.counts, vec![2, 0, 2]);
        assert_eq!(state.centroids.col(1), &[0.0, 0.0]);
        assert_eq!(state.centroids.col(0), &[0.0, 0.5]);
        assert_eq!(state.centroids.col(2), &[10.0, 0.5]);
        // the empty cluster moved all the way back to the origin
        assert_approx_eq!(state.shift, (1337.0f64 * 1337.0 + 42.0 * 42.0).sqrt(), 1e-9);
    }

    #[test]
    fn no_samples() {
        let samples = DenseMatrix::<f64>::zeros(3, 0);
        let centroids = DenseMatrix::from_columns(vec![1.0, 2.0, 2.0, 0.0, 0.0, 0.0], 3, 2).unwrap();
        let mut engine = IterationEngine::new(&samples, &EuclideanDistance);
        assert_eq!(engine.worker_count(), 1);
        let state = engine.step(&centroids).unwrap();

        assert_eq!(state.counts, vec![0, 0]);
        assert!(state.centroids.as_slice().iter().all(|&v| v == 0.0));
        assert_approx_eq!(state.shift, 3.0);
        assert_eq!(engine.distance_calculations(), 0);
    }

    #[test]
    fn invalid_centroids_are_rejected() {
        let (samples, _) = four_points();
        let mut engine = IterationEngine::new(&samples, &EuclideanDistance);
        let mut new_centroids = DenseMatrix::from_columns(vec![7.0], 1, 1).unwrap();
        let mut counts = vec![3];

        let no_clusters = DenseMatrix::zeros(2, 0);
        assert_eq!(engine.iterate(&no_clusters, &mut new_centroids, &mut counts), Err(KMeansError::NoClusters));

        let wrong_dims = DenseMatrix::zeros(3, 2);
        assert_eq!(engine.step(&wrong_dims), Err(KMeansError::DimensionMismatch { dataset: 2, centroids: 3 }));

        assert_eq!(engine.distance_calculations(), 0);
        assert_eq!(new_centroids.as_slice(), &[7.0]);
        assert_eq!(counts, vec![3]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (samples, _) = four_points();
        let conf = IterationConfig::build().min_points_per_worker(0).build();
        assert!(matches!(IterationEngine::with_config(&samples, &EuclideanDistance, conf), Err(KMeansError::InvalidConfig(_))));
        let conf = IterationConfig::build().max_workers(0).build();
        assert!(matches!(IterationEngine::with_config(&samples, &EuclideanDistance, conf), Err(KMeansError::InvalidConfig(_))));
    }

    #[test]
    fn distance_calculations_accumulate() {
        let mut rnd = StdRng::seed_from_u64(7);
        let samples = random_samples::<f64>(&mut rnd, 321, 4);
        let mut engine = IterationEngine::new(&samples, &EuclideanDistance);
        let mut centroids = leading_samples(&samples, 5);
        for i in 1..=4 {
            centroids = engine.step(&centroids).unwrap().centroids;
            assert_eq!(engine.distance_calculations(), i * 5 * 321);
        }
        // fewer clusters on the same engine
        engine.step(&leading_samples(&samples, 2)).unwrap();
        assert_eq!(engine.distance_calculations(), 4 * 5 * 321 + 2 * 321);
    }

    #[test]
    fn worker_count_follows_config() {
        let mut rnd = StdRng::seed_from_u64(3);
        let small = random_samples::<f64>(&mut rnd, 50, 2);
        let big = random_samples::<f64>(&mut rnd, 1037, 2);

        let engine = IterationEngine::with_config(&small, &EuclideanDistance, IterationConfig::build().max_workers(8).build()).unwrap();
        assert_eq!(engine.worker_count(), 1);
        let engine = IterationEngine::with_config(&big, &EuclideanDistance, IterationConfig::build().max_workers(8).build()).unwrap();
        assert_eq!(engine.worker_count(), 8);
        let engine = IterationEngine::with_config(&big, &EuclideanDistance, IterationConfig::build().max_workers(64).build()).unwrap();
        assert_eq!(engine.worker_count(), 10);
        let engine = IterationEngine::with_config(&big, &EuclideanDistance,
            IterationConfig::build().max_workers(64).min_points_per_worker(300).build()).unwrap();
        assert_eq!(engine.worker_count(), 3);
        assert_eq!(engine.config().min_points_per_worker(), 300);
        assert_eq!(engine.config().max_workers(), 64);
    }

    #[test]
    fn below_minimum_points_per_worker() {
        let mut rnd = StdRng::seed_from_u64(11);
        let samples = random_samples::<f64>(&mut rnd, 50, 3);
        let centroids = leading_samples(&samples, 4);
        let mut engine = IterationEngine::new(&samples, &EuclideanDistance);
        assert_eq!(engine.worker_count(), 1);

        let should = brute_force_step(&samples, &centroids);
        let state = engine.step(&centroids).unwrap();
        assert_eq!(state.counts, should.counts);
        assert_eq!(state.counts.iter().sum::<usize>(), 50);
        for (a, s) in state.centroids.as_slice().iter().zip(should.centroids.as_slice()) {
            assert_approx_eq!(*a, *s, 1e-12);
        }
    }

    #[test]
    fn matches_brute_force() {
        matches_brute_force_multiplex(1);
        matches_brute_force_multiplex(2);
        matches_brute_force_multiplex(3);
        matches_brute_force_multiplex(31);
        matches_brute_force_multiplex(100);
    }

    fn matches_brute_force_multiplex(dims: usize) {
        for (points, workers) in [(1000, 1), (1000, 3), (1037, 4), (4099, 8)] {
            let mut rnd = StdRng::seed_from_u64(1337 + dims as u64);
            let samples = random_samples::<f64>(&mut rnd, points, dims);
            let centroids = leading_samples(&samples, 5);

            let conf = IterationConfig::build().max_workers(workers).build();
            let mut engine = IterationEngine::with_config(&samples, &EuclideanDistance, conf).unwrap();
            let state = engine.step(&centroids).unwrap();
            let should = brute_force_step(&samples, &centroids);

            assert_eq!(state.counts, should.counts, "dims={} points={} workers={}", dims, points, workers);
            assert_eq!(state.counts.iter().sum::<usize>(), points);
            for (a, s) in state.centroids.as_slice().iter().zip(should.centroids.as_slice()) {
                assert_approx_eq!(*a, *s, 1e-9);
            }
            assert_approx_eq!(state.shift, should.shift, 1e-9);
        }
    }

    #[test]
    fn blobs_f32() {
        let mut rnd = StdRng::seed_from_u64(42);
        let (samples, centers) = blob_samples::<f32>(&mut rnd, 2000, 8, 4);
        let centroids = leading_samples(&samples, 4);

        let conf = IterationConfig::build().max_workers(4).build();
        let mut engine = IterationEngine::with_config(&samples, &EuclideanDistance, conf).unwrap();
        let state = engine.step(&centroids).unwrap();
        let should = brute_force_step(&samples, &centroids);

        assert_eq!(state.counts, vec![500; 4]);
        assert_eq!(state.counts, should.counts);
        for (a, s) in state.centroids.as_slice().iter().zip(should.centroids.as_slice()) {
            assert_approx_eq!(*a, *s, 1e-2f32);
        }
        // means of the blobs land close to the true centers
        for (a, c) in state.centroids.as_slice().iter().zip(centers.as_slice()) {
            assert_approx_eq!(*a, *c, 0.1f32);
        }
    }

    #[test]
    fn sparse_and_dense_agree() {
        let mut rnd = StdRng::seed_from_u64(5);
        let triplets: Vec<(usize, usize, f64)> = (0..3000)
            .map(|_| (rnd.gen_range(0..40), rnd.gen_range(0..600), rnd.gen::<f64>()))
            .collect();
        let sparse = SparseMatrix::from_triplets(40, 600, triplets).unwrap();
        let mut dense = DenseMatrix::zeros(40, 600);
        for c in 0..600 {
            let (rows, vals) = sparse.col(c);
            rows.iter().zip(vals).for_each(|(&r, &v)| dense.col_mut(c)[r] = v);
        }
        let centroids = leading_samples(&dense, 6);

        let conf = IterationConfig::build().max_workers(3).build();
        let mut sparse_engine = IterationEngine::with_config(&sparse, &EuclideanDistance, conf).unwrap();
        let mut dense_engine = IterationEngine::new(&dense, &EuclideanDistance);
        let (s, d) = (sparse_engine.step(&centroids).unwrap(), dense_engine.step(&centroids).unwrap());

        assert_eq!(s.counts, d.counts);
        assert_eq!(s.counts, brute_force_step(&dense, &centroids).counts);
        for (a, b) in s.centroids.as_slice().iter().zip(d.centroids.as_slice()) {
            assert_approx_eq!(*a, *b, 1e-12);
        }
        assert_approx_eq!(s.shift, d.shift, 1e-12);
        assert_eq!(sparse_engine.distance_calculations(), dense_engine.distance_calculations());
    }

    #[test]
    fn iteration_done_callback() {
        let (samples, centroids) = four_points();
        let calls = Cell::new(0);
        let last = RefCell::new((Vec::new(), 0.0));
        let callback = |counts: &[usize], shift: f64| {
            calls.set(calls.get() + 1);
            *last.borrow_mut() = (counts.to_vec(), shift);
        };
        let conf = IterationConfig::build().iteration_done(&callback).build();
        let mut engine = IterationEngine::with_config(&samples, &EuclideanDistance, conf).unwrap();

        engine.step(&centroids).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(last.borrow().0, vec![2, 2]);
        assert_approx_eq!(last.borrow().1, 1.0);

        // failed iterations are not reported
        assert!(engine.step(&DenseMatrix::zeros(2, 0)).is_err());
        assert_eq!(calls.get(), 1);
    }
}
