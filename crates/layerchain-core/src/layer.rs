//! The polymorphic layer contract.
//!
//! Every protocol implements [`Layer`]. A layer owns a [`BufferView`] that
//! starts at its first header byte and runs to the end of the capture
//! buffer, remembers a copy of its predecessor's identity, and exclusively
//! owns its successor through a [`LayerLink`]. Dropping a layer drops the
//! rest of the chain below it.
//!
//! Methods that only some protocols need (`parse_next`,
//! `recompute_derived_fields`) have no-op defaults so chain-walking code can
//! call them on any layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LayerError;
use crate::view::BufferView;

/// Protocol carried by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "ethercat")]
    EtherCat,
    #[serde(rename = "nbns")]
    Nbns,
    #[serde(rename = "pad_bytes")]
    PadBytes,
}

impl Protocol {
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::EtherCat => "EtherCAT",
            Protocol::Nbns => "NBNS",
            Protocol::PadBytes => "pad bytes",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// OSI model classification. Static per protocol, never derived from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsiLayer {
    Physical,
    DataLink,
    Network,
    Transport,
    Session,
    Presentation,
    Application,
}

/// Identity of the layer that produced this one.
///
/// This is a copy, not a pointer: successors never reach back into their
/// predecessor's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predecessor {
    pub protocol: Protocol,
    /// Absolute offset of the predecessor's first byte.
    pub offset: usize,
    pub header_len: usize,
}

pub type BoxedLayer<'a> = Box<dyn Layer<'a> + 'a>;

/// State shared by every concrete layer: its view and its neighbours.
#[derive(Debug)]
pub struct LayerLink<'a> {
    view: BufferView<'a>,
    prev: Option<Predecessor>,
    next: Option<BoxedLayer<'a>>,
}

impl<'a> LayerLink<'a> {
    pub fn new(view: BufferView<'a>, prev: Option<Predecessor>) -> Self {
        Self {
            view,
            prev,
            next: None,
        }
    }

    pub fn view(&self) -> BufferView<'a> {
        self.view
    }

    pub fn prev(&self) -> Option<Predecessor> {
        self.prev
    }

    pub fn next(&self) -> Option<&(dyn Layer<'a> + 'a)> {
        self.next.as_deref()
    }

    pub fn next_mut(&mut self) -> Option<&mut (dyn Layer<'a> + 'a)> {
        self.next.as_deref_mut()
    }

    /// Attach `next` as successor, returning the one it replaces.
    pub fn attach(&mut self, next: BoxedLayer<'a>) -> Option<BoxedLayer<'a>> {
        self.next.replace(next)
    }

    pub fn detach(&mut self) -> Option<BoxedLayer<'a>> {
        self.next.take()
    }
}

/// Constructor signature used by the dispatcher's protocol map.
///
/// Fails with [`LayerError::Malformed`] when the view is shorter than the
/// protocol's minimum header.
pub type LayerConstructor =
    for<'a> fn(BufferView<'a>, Option<Predecessor>) -> Result<BoxedLayer<'a>, LayerError>;

pub trait Layer<'a>: fmt::Debug {
    fn protocol(&self) -> Protocol;

    fn osi_layer(&self) -> OsiLayer;

    fn link(&self) -> &LayerLink<'a>;

    fn link_mut(&mut self) -> &mut LayerLink<'a>;

    /// Bytes this layer claims for itself, measured from the start of its view.
    ///
    /// May exceed the view length when the header declares more data than
    /// was captured.
    fn header_len(&self) -> usize;

    /// Build and attach the successor from the bytes after `header_len()`.
    ///
    /// Terminal layers keep the default, which attaches nothing.
    fn parse_next(&mut self) -> Result<(), LayerError> {
        Ok(())
    }

    /// Rewrite length/checksum fields after a mutation.
    fn recompute_derived_fields(&mut self) {}

    /// Human-readable summary. Lossy; not meant to be parsed back.
    fn describe(&self) -> String;

    fn view(&self) -> BufferView<'a> {
        self.link().view()
    }

    fn offset(&self) -> usize {
        self.view().start()
    }

    fn prev(&self) -> Option<Predecessor> {
        self.link().prev()
    }

    fn next_layer(&self) -> Option<&(dyn Layer<'a> + 'a)> {
        self.link().next()
    }

    fn next_layer_mut(&mut self) -> Option<&mut (dyn Layer<'a> + 'a)> {
        self.link_mut().next_mut()
    }

    /// `header_len()` clamped to the bytes actually present in the view.
    fn claimed_len(&self) -> usize {
        self.header_len().min(self.view().len())
    }

    /// Bytes after this layer's claimed header.
    fn remainder(&self) -> BufferView<'a> {
        self.view().tail_clamped(self.header_len())
    }

    /// Identity handed to a successor built by this layer.
    fn as_predecessor(&self) -> Predecessor {
        Predecessor {
            protocol: self.protocol(),
            offset: self.offset(),
            header_len: self.header_len(),
        }
    }
}

/// Iterator over a chain, from the given layer to the terminal one.
pub struct Layers<'c, 'a> {
    cursor: Option<&'c (dyn Layer<'a> + 'a)>,
}

impl<'c, 'a> Layers<'c, 'a> {
    pub fn new(first: &'c (dyn Layer<'a> + 'a)) -> Self {
        Self {
            cursor: Some(first),
        }
    }
}

impl<'c, 'a> Iterator for Layers<'c, 'a> {
    type Item = &'c (dyn Layer<'a> + 'a);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = current.next_layer();
        Some(current)
    }
}
