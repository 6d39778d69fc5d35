// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering a page to an HTML string.
//!
//! The article body arrives asynchronously; the HTML driver waits for the
//! sink to complete and prints the final tree.
//!
//! Run:
//! - `cargo run -p canopy_demos --example server_render`

use canopy_driver::{Driver, DriverError, HtmlDriver};
use canopy_stream::Stream;
use canopy_vtree::{UiNode, h};

fn main() -> Result<(), DriverError> {
    env_logger::init();

    let paragraphs = Stream::from_values(["Loading...", "Canopy renders streams of trees."])
        .map(|text| h("p").text(text).build());
    let page = h("html")
        .child(h("head").child(h("title").text("Canopy")))
        .child(
            h("body")
                .child(h("h1#title").text("Hello"))
                .child(UiNode::Async(paragraphs))
                .child(h("img").attr("src", "/logo.png").attr("alt", "logo")),
        )
        .build();

    let source = HtmlDriver::default().run(Stream::of(page))?;
    source.html().for_each(|html| println!("{html}"));
    Ok(())
}
