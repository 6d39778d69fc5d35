// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use canopy_dom::{Document, create, diff, patch};
use canopy_stream::{Stream, Subject};
use canopy_vtree::{UiNode, h, transpose};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn gen_table(rows: usize, cols: usize) -> UiNode {
    h("table")
        .children((0..rows).map(|r| {
            h("tr").children((0..cols).map(move |c| h("td").text(format!("{r}:{c}"))))
        }))
        .build()
}

fn bench_transpose(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpose");

    let table = gen_table(64, 8);
    group.bench_function("synchronous_table_64x8", |b| {
        b.iter(|| {
            let emitted = Rc::new(Cell::new(0_usize));
            let seen = emitted.clone();
            transpose(black_box(&table))
                .unwrap()
                .for_each(move |_| seen.set(seen.get() + 1));
            emitted.get()
        });
    });

    group.bench_function("async_cells_64", |b| {
        b.iter_batched(
            || {
                let cells: Vec<Subject<UiNode>> = (0..64).map(|_| Subject::replay_latest()).collect();
                for (i, cell) in cells.iter().enumerate() {
                    cell.next(UiNode::from(i.to_string()));
                }
                let tree = h("ul")
                    .children(cells.iter().map(|s| h("li").child(UiNode::Async(s.stream()))))
                    .build();
                (cells, tree)
            },
            |(cells, tree)| {
                let last = Rc::new(Cell::new(0_usize));
                let seen = last.clone();
                let sub = transpose(&tree)
                    .unwrap()
                    .for_each(move |t| seen.set(t.text_content().len()));
                for cell in &cells {
                    cell.next(UiNode::from("x"));
                }
                sub.unsubscribe();
                last.get()
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("switch_latest_100", |b| {
        b.iter(|| {
            let source = Stream::from_values((0..100).map(|i| h("p").text(i.to_string()).build()));
            let tree = UiNode::Async(source);
            let count = Rc::new(Cell::new(0_usize));
            let seen = count.clone();
            transpose(&tree)
                .unwrap()
                .for_each(move |_| seen.set(seen.get() + 1));
            count.get()
        });
    });
    group.finish();
}

fn bench_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch");
    let before = gen_table(64, 8);
    let after = {
        let mut t = gen_table(64, 8);
        if let UiNode::Element(table) = &mut t {
            table.children.truncate(60);
        }
        t
    };
    group.bench_function("diff_64x8_truncate", |b| {
        b.iter(|| black_box(diff(&before, &after)));
    });
    group.bench_function("create_and_patch_64x8", |b| {
        b.iter_batched(
            || {
                let mut doc = Document::new();
                let root = create(&mut doc, &before).unwrap();
                (doc, root)
            },
            |(mut doc, root)| {
                let edits = diff(&before, &after);
                patch(&mut doc, root, &edits).unwrap()
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_transpose, bench_patch);
criterion_main!(benches);
