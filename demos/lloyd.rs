use naive_kmeans::*;
use rand::prelude::*;

fn main() {
    pretty_env_logger::init();
    let (sample_cnt, sample_dims, k, max_iter) = (20000, 200, 4, 100);

    // Generate some clustered random data: k blobs around random centers
    let mut rnd = rand::rngs::StdRng::seed_from_u64(1337);
    let centers: Vec<f64> = (0..k * sample_dims).map(|_| rnd.gen_range(-10.0..10.0)).collect();
    let mut samples = vec![0.0f64;sample_cnt * sample_dims];
    samples.chunks_exact_mut(sample_dims).enumerate().for_each(|(i, s)| {
        let c = rnd.gen_range(0..k);
        s.iter_mut().zip(&centers[c * sample_dims..(c + 1) * sample_dims])
            .for_each(|(v, cv)| *v = cv + rnd.gen_range(-1.0..1.0) * (1.0 + (i % 3) as f64));
    });
    let samples = DenseMatrix::from_columns(samples, sample_dims, sample_cnt).expect("sample buffer");

    // Forgy-style initialization: k randomly chosen samples
    let mut centroids = DenseMatrix::zeros(sample_dims, k);
    for (ci, si) in rand::seq::index::sample(&mut rnd, sample_cnt, k).into_iter().enumerate() {
        centroids.col_mut(ci).copy_from_slice(samples.col(si));
    }

    let conf = IterationConfig::build()
        .iteration_done(&|counts, shift| println!("Cluster sizes: {:?} | Shift: {:.4}", counts, shift))
        .build();
    let mut engine = IterationEngine::with_config(&samples, &EuclideanDistance, conf).expect("valid config");
    println!("Using {} workers", engine.worker_count());

    let (mut new_centroids, mut counts) = (DenseMatrix::zeros(0, 0), Vec::new());
    for i in 1..=max_iter {
        let shift = engine.iterate(&centroids, &mut new_centroids, &mut counts).expect("valid centroids");
        std::mem::swap(&mut centroids, &mut new_centroids);
        if shift < 1e-9 {
            println!("Converged after {} iterations", i);
            break;
        }
    }

    println!("Cluster sizes: {:?}", counts);
    println!("Distance calculations: {}", engine.distance_calculations());
}
