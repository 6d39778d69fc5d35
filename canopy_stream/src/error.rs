// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::string::String;

/// Error value carried by a stream's error notification.
///
/// Errors are shared between every observer of a multicast stream, hence the
/// reference-counted trait object.
pub type StreamError = Rc<dyn core::error::Error>;

/// Errors raised by the stream operators themselves.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// [`Stream::last`](crate::Stream::last) saw its source complete without a value.
    #[error("no elements in sequence")]
    Empty,
    /// A free-form failure raised by user code through [`Stream::throw`](crate::Stream::throw).
    #[error("{0}")]
    Message(String),
}

impl SequenceError {
    /// Wrap the error for delivery through a stream.
    pub fn shared(self) -> StreamError {
        Rc::new(self)
    }
}
