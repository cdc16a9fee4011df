use thiserror::Error;

use crate::dispatch::ProtocolTag;
use crate::layer::Protocol;

/// Errors returned by [`BufferView`](crate::BufferView) construction and reads.
///
/// # Examples
/// ```
/// use layerchain_core::{BufferView, ViewError};
///
/// let err = BufferView::new(&[0u8; 2], 1, 4).unwrap_err();
/// assert!(matches!(err, ViewError::OutOfBounds { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("out of bounds: {len} bytes at offset {offset}, only {available} available")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },
}

/// Errors raised while constructing a layer or parsing its successor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("malformed {protocol} layer: need {needed} bytes, got {actual}")]
    Malformed {
        protocol: Protocol,
        needed: usize,
        actual: usize,
    },
    #[error(transparent)]
    OutOfBounds(#[from] ViewError),
}

/// Errors returned by [`Dispatcher::build`](crate::Dispatcher::build).
///
/// Either variant means no layer was produced at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown protocol {tag}: {undecoded} bytes left undecoded")]
    UnknownProtocol { tag: ProtocolTag, undecoded: usize },
    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// Errors returned by the Ethernet entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame slice error: {0}")]
    Slice(String),
    #[error("missing IP payload in frame")]
    MissingIpPayload,
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
