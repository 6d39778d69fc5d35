// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text output: rendering the final tree of a sink as HTML.

use canopy_dom::NodeId;
use canopy_stream::Stream;
use canopy_vtree::{UiNode, to_html};

use crate::config::{DriverConfig, EventOptions};
use crate::driver::Driver;
use crate::error::DriverError;
use crate::runtime::transpose_reporting;
use crate::source::DomEvent;

/// Serializes the last tree of a sink to HTML.
///
/// ```
/// use canopy_driver::{Driver, HtmlDriver};
/// use canopy_stream::Stream;
/// use canopy_vtree::h;
///
/// let source = HtmlDriver::default().run(Stream::of(h("p.note").text("saved").build()))?;
/// let out = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
/// let sink = out.clone();
/// source.html().for_each(move |html| *sink.borrow_mut() = html);
/// assert_eq!(*out.borrow(), r#"<p class="note">saved</p>"#);
/// # Ok::<(), canopy_driver::DriverError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct HtmlDriver {
    config: DriverConfig,
}

impl HtmlDriver {
    /// Replace the configuration.
    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }
}

impl Driver for HtmlDriver {
    type Sink = Stream<UiNode>;
    type Source = HtmlSource;

    fn run(self, sink: Stream<UiNode>) -> Result<HtmlSource, DriverError> {
        let config = self.config.clone();
        let trees = sink.switch_map(move |tree| transpose_reporting(&tree, &config));
        let config = self.config;
        let html = trees.last().filter_map(move |tree| match to_html(&tree) {
            Ok(html) => Some(html),
            Err(err) => {
                config.report(&DriverError::Serialize(err));
                None
            }
        });
        Ok(HtmlSource { html })
    }
}

/// What an [`HtmlDriver`] hands back.
#[derive(Clone, Debug)]
pub struct HtmlSource {
    html: Stream<String>,
}

impl HtmlSource {
    /// The serialized last tree, emitted once the sink completes.
    pub fn html(&self) -> Stream<String> {
        self.html.clone()
    }

    /// Selections have no meaning for text output.
    #[deprecated = "HTML output has no live elements; the selection is always empty"]
    pub fn select(&self, selector: &str) -> HtmlSelection {
        log::warn!("select(`{selector}`) on HTML output: there are no elements to select");
        HtmlSelection { _private: () }
    }
}

/// The empty selection of an [`HtmlSource`].
#[derive(Clone, Debug)]
pub struct HtmlSelection {
    _private: (),
}

impl HtmlSelection {
    /// Completes without emitting.
    pub fn elements(&self) -> Stream<Vec<NodeId>> {
        Stream::empty()
    }

    /// Completes without emitting.
    pub fn events(&self, _event_type: &str, _options: EventOptions) -> Stream<DomEvent> {
        Stream::empty()
    }

    /// Another empty selection.
    pub fn select(&self, _selector: &str) -> Self {
        self.clone()
    }
}
