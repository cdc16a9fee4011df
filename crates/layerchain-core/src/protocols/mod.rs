//! Concrete layer implementations.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets, masks and well-known identifiers
//! - `reader`: checked reads over a [`BufferView`](crate::BufferView)
//! - `layer`: the [`Layer`](crate::Layer) implementation and accessors
//!
//! Layers never index raw bytes directly and perform no I/O.

pub mod ethercat;
pub mod nbns;
pub mod trailer;
