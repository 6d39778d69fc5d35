// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_dom::{Document, NativeEvent, NodeId, Selector, create, query_selector_all};
use canopy_scope::{PreparedScope, ScopeNamespace};
use canopy_vtree::{UiNode, h};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// `breadth` isolated components, each holding a list of `items` rows and a
/// nested isolated footer.
fn gen_page(breadth: usize, items: usize) -> UiNode {
    let components = (0..breadth).map(|c| {
        let rows = (0..items).map(|i| h("li.row").child(h("span.label").text(i.to_string())));
        h("section.component")
            .child(h("ul").children(rows))
            .child(
                h("footer")
                    .child(h("span.label").text("footer"))
                    .build()
                    .with_isolation(format!("footer-{c}")),
            )
            .build()
            .with_isolation(format!("component-{c}"))
    });
    h("main").children(components).build()
}

fn mount(tree: &UiNode) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = create(&mut doc, tree).unwrap();
    let body = doc.body();
    doc.append_child(body, root).unwrap();
    (doc, root)
}

fn bench_resolve(c: &mut Criterion) {
    let (doc, root) = mount(&gen_page(32, 64));
    let mut group = c.benchmark_group("resolve");

    let unscoped = Selector::parse("section .label").unwrap();
    group.bench_function("query_selector_all_unscoped", |b| {
        b.iter(|| black_box(query_selector_all(&doc, root, &unscoped)));
    });

    let scoped = PreparedScope::new(
        &ScopeNamespace::new()
            .with_isolation("component-17")
            .with_selector(".label"),
    )
    .unwrap();
    group.bench_function("isolated_component_labels", |b| {
        b.iter(|| black_box(scoped.resolve(&doc, root)));
    });

    let wildcard = PreparedScope::new(
        &ScopeNamespace::new()
            .with_isolation("component-17")
            .with_selector("*"),
    )
    .unwrap();
    group.bench_function("isolated_component_wildcard", |b| {
        b.iter(|| black_box(wildcard.resolve(&doc, root)));
    });

    group.bench_function("prepare_namespace", |b| {
        let ns = ScopeNamespace::new()
            .with_isolation("component-3")
            .with_selector("ul")
            .with_selector("li.row, li.other");
        b.iter(|| black_box(PreparedScope::new(&ns).unwrap()));
    });
    group.finish();
}

fn bench_bubbling(c: &mut Criterion) {
    let (doc, root) = mount(&gen_page(32, 64));
    let labels = query_selector_all(&doc, root, &Selector::parse(".row .label").unwrap());
    let target = labels[labels.len() / 2];
    let mut group = c.benchmark_group("simulate_bubbling");

    let rows = PreparedScope::new(
        &ScopeNamespace::new()
            .with_isolation("component-16")
            .with_selector("li.row"),
    )
    .unwrap();
    group.bench_function("row_delegation", |b| {
        b.iter(|| {
            let ev = NativeEvent::new("change", target);
            black_box(rows.simulate_bubbling(&doc, root, &ev))
        });
    });

    let miss = PreparedScope::new(&ScopeNamespace::new().with_selector("aside")).unwrap();
    group.bench_function("walk_to_root_without_match", |b| {
        b.iter(|| {
            let ev = NativeEvent::new("change", target);
            black_box(miss.simulate_bubbling(&doc, root, &ev))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_resolve, bench_bubbling);
criterion_main!(benches);
