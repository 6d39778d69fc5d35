// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Driver configuration.

use std::fmt;
use std::rc::Rc;

use canopy_dom::NodeId;

use crate::error::DriverError;

/// Callback receiving failures of in-flight render passes.
pub type ErrorHandler = Rc<dyn Fn(&DriverError)>;

/// Options shared by [`DomDriver`](crate::DomDriver) and
/// [`HtmlDriver`](crate::HtmlDriver).
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use canopy_driver::DriverConfig;
///
/// let failures = Rc::new(Cell::new(0));
/// let seen = failures.clone();
/// let config = DriverConfig::default()
///     .with_error_handler(move |_| seen.set(seen.get() + 1))
///     .with_capture_all(true);
/// assert!(config.capture_all());
/// ```
#[derive(Clone)]
pub struct DriverConfig {
    error_handler: ErrorHandler,
    capture_all: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            error_handler: Rc::new(|err: &DriverError| log::error!("DOM driver: {err}")),
            capture_all: false,
        }
    }
}

impl fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverConfig")
            .field("capture_all", &self.capture_all)
            .finish_non_exhaustive()
    }
}

impl DriverConfig {
    /// Route render failures to `handler` instead of the log.
    pub fn with_error_handler(mut self, handler: impl Fn(&DriverError) + 'static) -> Self {
        self.error_handler = Rc::new(handler);
        self
    }

    /// Listen in the capture phase for every event type, not only for the
    /// types that do not bubble natively.
    pub fn with_capture_all(mut self, capture_all: bool) -> Self {
        self.capture_all = capture_all;
        self
    }

    /// Whether every native listener uses the capture phase.
    pub fn capture_all(&self) -> bool {
        self.capture_all
    }

    pub(crate) fn report(&self, err: &DriverError) {
        (self.error_handler)(err);
    }
}

/// Options of a single [`DomSource::events`](crate::DomSource::events) call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EventOptions {
    /// Listen in the capture phase.
    pub use_capture: bool,
}

impl EventOptions {
    /// Capture-phase listening.
    pub const CAPTURE: Self = Self { use_capture: true };
}

/// Where a [`DomDriver`](crate::DomDriver) renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Container {
    /// The first element of the document matching a CSS selector.
    Selector(String),
    /// A specific element.
    Node(NodeId),
}

impl From<&str> for Container {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_owned())
    }
}

impl From<String> for Container {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<NodeId> for Container {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}
