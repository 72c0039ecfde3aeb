use criterion::{Criterion, criterion_group, criterion_main};
use medinotes_engine::editing::{
    Cmd, Editor, EditorOptions, Mark, Node, Selection, Step, SyncController, Transaction,
    to_json,
};
mod common;

fn bench_transactions(c: &mut Criterion) {
    let mut group = c.benchmark_group("transactions");
    group.sample_size(10);

    let doc = common::generate_notebook(200);

    group.bench_function("insert_text", |b| {
        b.iter(|| {
            let tx = Transaction::from(Step::Insert {
                pos: std::hint::black_box(3),
                nodes: vec![Node::text("x")],
            });
            std::hint::black_box(tx.apply(&doc))
        });
    });

    group.bench_function("cross_block_delete", |b| {
        b.iter(|| {
            let tx = Transaction::from(Step::Delete {
                from: std::hint::black_box(5),
                to: std::hint::black_box(40),
            });
            std::hint::black_box(tx.apply(&doc))
        });
    });

    group.bench_function("set_mark", |b| {
        b.iter(|| {
            let tx = Transaction::from(Step::SetMark {
                from: std::hint::black_box(14),
                to: std::hint::black_box(30),
                mark: Mark::Italic,
            });
            std::hint::black_box(tx.apply(&doc))
        });
    });

    group.bench_function("typing_with_history", |b| {
        let mut editor = Editor::new(doc.clone(), EditorOptions::default());
        editor.set_selection(Selection::cursor(3));
        b.iter(|| {
            let patch = editor.apply(Cmd::TypeText {
                text: std::hint::black_box("a".to_string()),
            });
            std::hint::black_box(patch)
        });
    });

    group.bench_function("sync_echo", |b| {
        let mut sync = SyncController::new(doc.clone());
        let value = to_json(&doc);
        b.iter(|| std::hint::black_box(sync.receive_json(&value)));
    });

    group.finish();
}

criterion_group!(benches, bench_transactions);
criterion_main!(benches);
