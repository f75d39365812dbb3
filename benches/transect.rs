use std::{env, path::Path, time::Duration};

use criterion::{Criterion, criterion_group, criterion_main};
use transect::{
    Dataset, Planner,
    planner::RoutePreference,
    raptor::Allocator,
    shared::{geo::Coordinate, time::Time},
};

fn short_plan(planner: &Planner, allocator: &mut Allocator, preference: &RoutePreference) {
    let origin = Coordinate::new(37.4979, 127.0276);
    let destination = Coordinate::new(37.5088, 127.0631);
    let _ = std::hint::black_box(planner.plan(allocator, origin, destination, Time::from_seconds(28800), preference, None));
}

fn long_plan(planner: &Planner, allocator: &mut Allocator, preference: &RoutePreference) {
    let origin = Coordinate::new(37.4651, 127.0102);
    let destination = Coordinate::new(37.5501, 127.1390);
    let _ = std::hint::black_box(planner.plan(allocator, origin, destination, Time::from_seconds(28800), preference, None));
}

fn criterion_benchmark(c: &mut Criterion) {
    let dataset_dir = match env::var("DATASET_DIR") {
        Ok(path_str) => Path::new(&path_str).to_owned(),
        Err(err) => {
            println!("Missing DATASET_DIR environment variable: {err}");
            return;
        }
    };

    let dataset = Dataset::load_dir(&dataset_dir).expect("failed to load dataset");
    let planner = Planner::new(&dataset);
    let preference = RoutePreference::default();
    let mut allocator = Allocator::new(&dataset.repository);

    let mut group = c.benchmark_group("Routing");
    group.warm_up_time(Duration::from_secs(5));
    group.measurement_time(Duration::from_secs(15));

    group.bench_function("Short route plan", |b| {
        b.iter(|| short_plan(&planner, &mut allocator, &preference))
    });

    group.bench_function("Long route plan", |b| {
        b.iter(|| long_plan(&planner, &mut allocator, &preference))
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
