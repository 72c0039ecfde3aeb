use criterion::{Criterion, criterion_group, criterion_main};
use medinotes_engine::layout::{
    MenuOptions, MenuSize, Rect, block_at_coordinates, bounding_rect_for_range,
    compute_menu_position, position_at_coordinates,
};
mod common;

fn bench_hit_testing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_testing");

    let doc = common::generate_notebook(500);
    let layout = common::generate_layout(&doc);

    group.bench_function("position_at_coordinates", |b| {
        b.iter(|| {
            std::hint::black_box(position_at_coordinates(
                &doc,
                &layout,
                std::hint::black_box(40.0),
                std::hint::black_box(7_000.0),
            ))
        });
    });

    group.bench_function("block_at_coordinates", |b| {
        b.iter(|| {
            std::hint::black_box(block_at_coordinates(
                &layout,
                std::hint::black_box(40.0),
                std::hint::black_box(7_000.0),
            ))
        });
    });

    group.bench_function("menu_for_selection", |b| {
        let container = Rect::new(0.0, 0.0, 800.0, 40_000.0);
        b.iter(|| {
            let anchor = bounding_rect_for_range(&doc, &layout, 1_000, 1_030);
            std::hint::black_box(compute_menu_position(
                anchor,
                container,
                MenuSize::new(240.0, 32.0),
                MenuOptions::default(),
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_hit_testing);
criterion_main!(benches);
