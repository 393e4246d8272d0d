use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use garrec::autograd::{clear_graph, no_grad, Tensor};
use garrec::recommend::{ContentFeatures, GarConfig, GarRec, IdBatch, ItemPartition};

const NUM_USER: usize = 200;
const DIM_E: usize = 64;

fn content(num_item: usize, width: usize) -> Tensor {
    let data = (0..num_item * width)
        .map(|i| ((i * 7919) % 1000) as f32 / 1000.0 - 0.5)
        .collect();
    Tensor::from_vec(data, &[num_item, width])
}

fn build_model(num_item: usize) -> GarRec {
    let warm: Vec<usize> = (NUM_USER..NUM_USER + num_item / 2).collect();
    let cold: Vec<usize> = (NUM_USER + num_item / 2..NUM_USER + num_item).collect();
    GarRec::new(
        GarConfig::new(NUM_USER, num_item, DIM_E).with_seed(42),
        ItemPartition::new(warm, cold),
        ContentFeatures::new()
            .with_visual(content(num_item, 128))
            .with_text(content(num_item, 64)),
    )
    .expect("valid model")
}

fn training_batch(batch: usize, num_item: usize) -> (IdBatch, IdBatch) {
    let users: Vec<usize> = (0..batch).map(|i| i % NUM_USER).collect();
    let rows: Vec<Vec<usize>> = (0..batch)
        .map(|i| vec![NUM_USER + (i * 31) % num_item, NUM_USER + (i * 17) % num_item])
        .collect();
    (
        IdBatch::repeat_rows(&users, 2).expect("users"),
        IdBatch::from_rows(&rows).expect("items"),
    )
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("garrec_score");

    for num_item in [100, 1_000].iter() {
        let model = build_model(*num_item);
        let users: Vec<usize> = (0..32).collect();
        let items: Vec<usize> = (NUM_USER..NUM_USER + num_item).collect();

        group.bench_with_input(BenchmarkId::from_parameter(num_item), num_item, |b, _| {
            b.iter(|| no_grad(|| model.score(black_box(&users), black_box(&items))));
        });
    }

    group.finish();
}

fn bench_losses(c: &mut Criterion) {
    let mut group = c.benchmark_group("garrec_losses");
    group.sample_size(20); // generator runs over the whole content bank

    for num_item in [100, 1_000].iter() {
        let model = build_model(*num_item);
        let (users, items) = training_batch(64, *num_item);

        group.bench_with_input(BenchmarkId::from_parameter(num_item), num_item, |b, _| {
            b.iter(|| {
                let losses = model.compute_losses(black_box(&users), black_box(&items));
                clear_graph();
                losses
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_score, bench_losses);
criterion_main!(benches);
