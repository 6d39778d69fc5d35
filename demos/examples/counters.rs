// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two isolated counter components inside one page.
//!
//! Each counter renders through an isolated sink and listens through an
//! isolated source, so the `button` selections of one counter never see the
//! buttons of the other, nor the page's own reset button.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p canopy_demos --example counters`

use std::cell::RefCell;
use std::rc::Rc;

use canopy_dom::{Document, NativeEvent, NodeId, Selector, dispatch_event, query_selector};
use canopy_driver::{DomDriver, DomSource, Driver, DriverError, EventOptions};
use canopy_stream::{Stream, Subject};
use canopy_vtree::{UiNode, h, to_html};

/// Wire one counter: its clicks feed its own state, its state feeds its view.
fn counter(dom: &DomSource, scope: &str, label: &str) -> Result<Stream<UiNode>, DriverError> {
    let count = Subject::replay_latest();
    count.next(0_i64);
    let scoped = dom.isolate_source(scope)?;
    let state = count.clone();
    scoped
        .select("button.inc")?
        .events("click", EventOptions::default())?
        .for_each(move |_| state.next(state.latest().unwrap_or_default() + 1));
    let state = count.clone();
    scoped
        .select("button.dec")?
        .events("click", EventOptions::default())?
        .for_each(move |_| state.next(state.latest().unwrap_or_default() - 1));

    let label = label.to_owned();
    let view = count.stream().map(move |n| {
        h("div.counter")
            .child(h("span.label").text(format!("{label}: {n}")))
            .child(h("button.dec").text("-"))
            .child(h("button.inc").text("+"))
            .build()
    });
    Ok(DomSource::isolate_sink(&view, scope))
}

fn find(doc: &Rc<RefCell<Document>>, selector: &str) -> Option<NodeId> {
    let doc = doc.borrow();
    let selector = Selector::parse(selector).ok()?;
    query_selector(&doc, doc.body(), &selector)
}

fn click(doc: &Rc<RefCell<Document>>, selector: &str) {
    if let Some(target) = find(doc, selector) {
        log::info!("click {selector}");
        dispatch_event(doc, NativeEvent::new("click", target));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut document = Document::new();
    let app = document.create_element("div")?;
    document.set_attribute(app, "id", "app")?;
    let body = document.body();
    document.append_child(body, app)?;
    let doc = Rc::new(RefCell::new(document));

    // The page view depends on the counters, and the counters need the
    // driver's source; close the loop through a subject.
    let page = Subject::new();
    let dom = DomDriver::new(doc.clone(), "#app")?.run(page.stream())?;

    let apples = counter(&dom, "apples", "Apples")?;
    let pears = counter(&dom, "pears", "Pears")?;
    let view = Stream::combine_latest([apples, pears]).map(|counters| {
        h("main")
            .child(h("h1").text("Fruit"))
            .children(counters)
            .child(h("button.reset").text("Reset all"))
            .build()
    });
    view.for_each(move |tree| page.next(tree));

    click(&doc, "[data-isolate=\"apples\"] .inc");
    click(&doc, "[data-isolate=\"apples\"] .inc");
    click(&doc, "[data-isolate=\"pears\"] .dec");
    // Not part of either counter.
    click(&doc, ".reset");

    let tree = canopy_dom::read_tree(&doc.borrow(), app);
    if let Some(tree) = tree {
        println!("{}", to_html(&tree)?);
    }
    dom.dispose();
    Ok(())
}
