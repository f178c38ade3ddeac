//! # naive-kmeans - API documentation
//!
//! naive-kmeans is a small rust library computing single iterations of Lloyd's k-means algorithm.
//!
//! ## Design target
//! It's main target is throughput on a single machine: one iteration is a tight double loop over
//! samples and clusters, split across parallel workers that each sum into their own private
//! accumulators. The workers only synchronize once, when merging their partial sums.
//! Squared euclidean distances are computed through `‖s‖² + ‖c‖² - 2·s·c` with cached centroid
//! norms, so only one inner product per sample/centroid pair is needed and no difference vector
//! is ever materialized. For the numerical caveats, see [`IterationEngine`].
//!
//! ## Scope
//! This crate only does the update step. Choosing initial centroids, deciding when to stop,
//! and re-seeding clusters that ran empty are left to the caller.
//!
//! ## Supported storage
//! Samples are given through the [`Dataset`] trait, one sample per column. Two implementations are included:
//! - [`DenseMatrix`] (column-major)
//! - [`SparseMatrix`] (compressed sparse column)
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! ```rust
//! use naive_kmeans::*;
//!
//! fn main() {
//!     let (sample_cnt, sample_dims, k, max_iter) = (2000, 20, 4, 100);
//!
//!     // Generate some random data
//!     let mut samples = vec![0.0f64;sample_cnt * sample_dims];
//!     samples.iter_mut().for_each(|v| *v = rand::random());
//!     let samples = DenseMatrix::from_columns(samples, sample_dims, sample_cnt).unwrap();
//!
//!     // Use the first k samples as initial centroids
//!     let mut centroids = DenseMatrix::from_columns(samples.as_slice()[..sample_dims * k].to_vec(), sample_dims, k).unwrap();
//!
//!     let mut engine = IterationEngine::new(&samples, &EuclideanDistance);
//!     for _ in 0..max_iter {
//!         let state = engine.step(&centroids).unwrap();
//!         centroids = state.centroids;
//!         if state.shift < 1e-6 { break; }
//!     }
//!
//!     println!("Centroids: {:?}", centroids);
//!     println!("Distance calculations: {}", engine.distance_calculations());
//! }
//! ```
//!
//! ## Example (using the status event callback)
//! ```rust
//! use naive_kmeans::*;
//!
//! fn main() {
//!     let samples = DenseMatrix::from_columns(vec![0.0f32, 0.0, 0.0, 1.0, 10.0, 0.0, 10.0, 1.0], 2, 4).unwrap();
//!     let centroids = DenseMatrix::from_columns(vec![0.0, 0.0, 10.0, 0.0], 2, 2).unwrap();
//!
//!     let conf = IterationConfig::build()
//!         .max_workers(2)
//!         .iteration_done(&|counts, shift| println!("Counts: {:?} | Shift: {:.2}", counts, shift))
//!         .build();
//!
//!     let mut engine = IterationEngine::with_config(&samples, &EuclideanDistance, conf).unwrap();
//!     let (mut new_centroids, mut counts) = (DenseMatrix::zeros(0, 0), Vec::new());
//!     let shift = engine.iterate(&centroids, &mut new_centroids, &mut counts).unwrap();
//!     assert_eq!(shift, 1.0);
//! }
//! ```
//!
//! ## Short API-Overview / Description
//! Entry-point of the library is the [`IterationEngine`] struct. It borrows the samples (any [`Dataset`])
//! and a [`SquaredEuclidean`] distance function, both of which have to outlive it. Each call of
//! [`IterationEngine::iterate`] takes the current centroids and writes the new centroids and the
//! per-cluster sample counts into the given output buffers, returning the summed centroid movement.
//! [`IterationEngine::step`] does the same, but allocates the outputs and returns them as [`IterationState`].
//!
//! The engine counts all sample-centroid distance evaluations over its lifetime, see
//! [`IterationEngine::distance_calculations`]. Parallelism is configured through [`IterationConfig`].
//!
//! The crate logs through the [`log`] facade; install any logger to see per-iteration details.

#[macro_use] mod helpers;
mod memory;
mod error;
mod api;
mod datasets;
mod distances;
mod variants;

pub use api::{IterationConfig, IterationConfigBuilder, IterationDoneCallbackFn, IterationEngine, IterationState};
pub use datasets::{Dataset, DenseMatrix, SparseMatrix};
pub use distances::{DistanceFunction, EuclideanDistance, SquaredEuclidean};
pub use error::{KMeansError, Result};
pub use memory::Primitive;
