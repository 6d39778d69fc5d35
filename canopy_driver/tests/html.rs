// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text output.

use std::cell::RefCell;
use std::rc::Rc;

use canopy_driver::{Driver, DriverConfig, DriverError, EventOptions, HtmlDriver};
use canopy_stream::{Observer, Stream, Subject};
use canopy_vtree::{UiNode, h};

fn collect(stream: &Stream<String>) -> Rc<RefCell<Vec<String>>> {
    let out = Rc::new(RefCell::new(Vec::new()));
    let sink = out.clone();
    stream.for_each(move |html| sink.borrow_mut().push(html));
    out
}

#[test]
fn last_tree_is_serialized() {
    let sink = Subject::new();
    let source = HtmlDriver::default().run(sink.stream()).unwrap();
    let out = collect(&source.html());
    sink.next(h("p").text("draft").build());
    sink.next(
        h("article#post")
            .child(h("h1").text("Title"))
            .child(h("p").text("a < b"))
            .build(),
    );
    assert!(out.borrow().is_empty());
    sink.complete();
    assert_eq!(
        *out.borrow(),
        [r#"<article id="post"><h1>Title</h1><p>a &lt; b</p></article>"#]
    );
}

#[test]
fn asynchronous_branches_are_resolved_first() {
    let name = Stream::from_values(["Ada", "Grace"]).map(UiNode::from);
    let view = h("p").child("Hello, ").child(UiNode::Async(name)).build();
    let source = HtmlDriver::default().run(Stream::of(view)).unwrap();
    assert_eq!(*collect(&source.html()).borrow(), ["<p>Hello, Grace</p>"]);
}

#[test]
fn isolation_is_written_out() {
    let view = h("div").isolate("child").text("x").build();
    let source = HtmlDriver::default().run(Stream::of(view)).unwrap();
    assert_eq!(
        *collect(&source.html()).borrow(),
        [r#"<div data-isolate="child">x</div>"#]
    );
}

#[test]
fn failures_go_to_the_error_handler() {
    let errors = Rc::new(RefCell::new(0));
    let seen = errors.clone();
    let config = DriverConfig::default().with_error_handler(move |err| {
        assert!(matches!(err, DriverError::UnsupportedNodeShape(_)));
        *seen.borrow_mut() += 1;
    });
    let bad = UiNode::Element(canopy_vtree::Element::new(""));
    let source = HtmlDriver::default()
        .with_config(config)
        .run(Stream::from_values([bad, h("i").build()]))
        .unwrap();
    assert_eq!(*collect(&source.html()).borrow(), ["<i></i>"]);
    assert_eq!(*errors.borrow(), 1);
}

#[test]
#[allow(deprecated, reason = "Exercises the deprecated selection surface.")]
fn selection_is_empty() {
    let source = HtmlDriver::default()
        .run(Stream::of(h("p").build()))
        .unwrap();
    let selection = source.select("p").select("span");
    let completed = Rc::new(RefCell::new(0));
    let elements_done = completed.clone();
    selection.elements().subscribe(
        Observer::new(|_| panic!("no elements expected"))
            .with_complete(move || *elements_done.borrow_mut() += 1),
    );
    let events_done = completed.clone();
    selection
        .events("click", EventOptions::default())
        .subscribe(
            Observer::new(|_| panic!("no events expected"))
                .with_complete(move || *events_done.borrow_mut() += 1),
        );
    assert_eq!(*completed.borrow(), 2);
}
