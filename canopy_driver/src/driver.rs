// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The DOM driver: rendering a stream of trees into a live container.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use canopy_dom::{Document, NodeId, Selector, query_selector, read_tree};
use canopy_stream::{Observer, Stream};
use canopy_vtree::UiNode;

use crate::config::{Container, DriverConfig};
use crate::error::DriverError;
use crate::runtime::{Runtime, transpose_reporting};
use crate::source::DomSource;

/// Something that consumes an application's sink and produces a source.
pub trait Driver: Sized {
    /// What the application feeds the driver.
    type Sink: 'static;
    /// What the driver hands back.
    type Source;

    /// Start the driver.
    fn run(self, sink: Self::Sink) -> Result<Self::Source, DriverError>;

    /// Start the driver from a type-erased sink.
    ///
    /// Fails with [`DriverError::InvalidSinkShape`] unless `sink` holds a
    /// [`Self::Sink`].
    fn run_erased(self, sink: Box<dyn Any>) -> Result<Self::Source, DriverError> {
        match sink.downcast::<Self::Sink>() {
            Ok(sink) => self.run(*sink),
            Err(_) => Err(DriverError::InvalidSinkShape),
        }
    }
}

/// Renders a stream of [`UiNode`] trees into a container of a [`Document`].
///
/// Each tree is transposed, diffed against the previous one and patched into
/// the container. The container's existing content is read back as the tree
/// preceding the first one.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use canopy_dom::Document;
/// use canopy_driver::{DomDriver, Driver};
/// use canopy_stream::Stream;
/// use canopy_vtree::h;
///
/// let mut doc = Document::new();
/// let app = doc.create_element("div").unwrap();
/// doc.set_attribute(app, "id", "app").unwrap();
/// let body = doc.body();
/// doc.append_child(body, app).unwrap();
/// let doc = Rc::new(RefCell::new(doc));
///
/// let driver = DomDriver::new(doc.clone(), "#app")?;
/// let source = driver.run(Stream::of(h("h1").text("Hello").build()))?;
/// assert_eq!(doc.borrow().text_content(app), "Hello");
/// source.dispose();
/// # Ok::<(), canopy_driver::DriverError>(())
/// ```
pub struct DomDriver {
    doc: Rc<RefCell<Document>>,
    container: NodeId,
    config: DriverConfig,
}

impl fmt::Debug for DomDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomDriver")
            .field("container", &self.container)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DomDriver {
    /// Prepare a driver rendering into `container`.
    ///
    /// A selector picks the first matching element in document order (the
    /// body included). Fails with [`DriverError::InvalidContainer`] when the
    /// container is not a live element.
    pub fn new(
        doc: Rc<RefCell<Document>>,
        container: impl Into<Container>,
    ) -> Result<Self, DriverError> {
        let container = resolve_container(&doc.borrow(), container.into())?;
        Ok(Self {
            doc,
            container,
            config: DriverConfig::default(),
        })
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    /// The container element.
    pub fn container(&self) -> NodeId {
        self.container
    }
}

fn resolve_container(doc: &Document, container: Container) -> Result<NodeId, DriverError> {
    match container {
        Container::Node(node) if doc.is_element(node) => Ok(node),
        Container::Node(node) => Err(DriverError::InvalidContainer(format!("{node:?}"))),
        Container::Selector(selector) => {
            let parsed = Selector::parse(&selector)
                .map_err(|_| DriverError::InvalidContainer(selector.clone()))?;
            let body = doc.body();
            if parsed.matches(doc, body) {
                return Ok(body);
            }
            query_selector(doc, body, &parsed).ok_or(DriverError::InvalidContainer(selector))
        }
    }
}

impl Driver for DomDriver {
    type Sink = Stream<UiNode>;
    type Source = DomSource;

    fn run(self, sink: Stream<UiNode>) -> Result<DomSource, DriverError> {
        let initial = read_tree(&self.doc.borrow(), self.container)
            .ok_or_else(|| DriverError::InvalidContainer(format!("{:?}", self.container)))?;
        let runtime = Rc::new(Runtime::new(
            self.doc,
            self.container,
            initial,
            self.config,
        ));
        let source = DomSource::new(runtime.clone())?;

        let config = runtime.config.clone();
        let trees = sink.switch_map(move |tree| transpose_reporting(&tree, &config));
        let on_tree = Rc::downgrade(&runtime);
        let on_error = Rc::downgrade(&runtime);
        let observer = Observer::new(move |tree: UiNode| {
            if let Some(runtime) = on_tree.upgrade() {
                runtime.render(&tree);
            }
        })
        .with_error(move |err| {
            if let Some(runtime) = on_error.upgrade() {
                runtime.config.report(&DriverError::from_stream(err));
            }
        });
        log::debug!("DOM driver running on {:?}", runtime.container);
        runtime.attach(trees.subscribe(observer));
        Ok(source)
    }
}
