// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_dom::{DomError, PatchError, SelectorError};
use canopy_stream::StreamError;
use canopy_vtree::{SerializeError, TransposeError};

/// Errors raised by the drivers.
///
/// Construction-time misuse ([`InvalidContainer`](Self::InvalidContainer),
/// [`InvalidSinkShape`](Self::InvalidSinkShape),
/// [`InvalidSelectorArgument`](Self::InvalidSelectorArgument),
/// [`Listener`](Self::Listener)) is returned from the call that caused it.
/// Failures of an in-flight render pass go to the configured error handler
/// instead; see [`DriverConfig::with_error_handler`](crate::DriverConfig::with_error_handler).
#[derive(Clone, Debug, thiserror::Error)]
pub enum DriverError {
    /// The container does not resolve to a live element.
    #[error("cannot render into unknown element `{0}`")]
    InvalidContainer(String),
    /// A scoped selection was given an empty or unparsable selector.
    #[error("invalid selector `{selector}`")]
    InvalidSelectorArgument {
        /// The offending selector.
        selector: String,
        /// Why it was rejected.
        source: SelectorError,
    },
    /// The driver was given something other than a stream of UI trees.
    #[error("the driver expects a stream of UI trees as its sink")]
    InvalidSinkShape,
    /// A tree of the sink could not be transposed.
    #[error(transparent)]
    UnsupportedNodeShape(#[from] TransposeError),
    /// The operation was attempted after [`DomSource::dispose`](crate::DomSource::dispose).
    #[error("the driver has been disposed")]
    DriverDisposed,
    /// A native listener could not be attached.
    #[error("cannot attach a native event listener")]
    Listener(#[source] DomError),
    /// A rendered tree could not be patched into the document.
    #[error("failed to patch the live tree")]
    Patch(#[from] PatchError),
    /// A rendered tree could not be serialized.
    #[error("failed to serialize the tree")]
    Serialize(#[from] SerializeError),
    /// The sink, or one of its asynchronous branches, failed.
    #[error("render stream failed: {0}")]
    Stream(StreamError),
}

impl DriverError {
    /// Classify an error notification of a render stream.
    pub(crate) fn from_stream(err: StreamError) -> Self {
        match err.downcast_ref::<TransposeError>() {
            Some(transpose) => Self::UnsupportedNodeShape(transpose.clone()),
            None => Self::Stream(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn transpose_errors_are_recognized_in_streams() {
        let err: StreamError = Rc::new(TransposeError::UnsupportedNodeShape {
            reason: "bad".into(),
        });
        assert!(matches!(
            DriverError::from_stream(err),
            DriverError::UnsupportedNodeShape(_)
        ));
        let other: StreamError = canopy_stream::SequenceError::Empty.shared();
        assert!(matches!(DriverError::from_stream(other), DriverError::Stream(_)));
    }
}
