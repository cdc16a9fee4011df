//! Raw trailer: bytes with no further structure, typically link-layer
//! padding up to the minimum frame size.

use crate::error::LayerError;
use crate::layer::{BoxedLayer, Layer, LayerLink, OsiLayer, Predecessor, Protocol};
use crate::view::BufferView;

#[derive(Debug)]
pub struct TrailerLayer<'a> {
    link: LayerLink<'a>,
}

impl<'a> TrailerLayer<'a> {
    /// Any length is valid, including zero.
    pub fn new(view: BufferView<'a>, prev: Option<Predecessor>) -> Self {
        Self {
            link: LayerLink::new(view, prev),
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.link.view().as_bytes()
    }

    pub fn to_hex(&self) -> String {
        self.link.view().to_hex()
    }
}

impl<'a> Layer<'a> for TrailerLayer<'a> {
    fn protocol(&self) -> Protocol {
        Protocol::PadBytes
    }

    fn osi_layer(&self) -> OsiLayer {
        OsiLayer::DataLink
    }

    fn link(&self) -> &LayerLink<'a> {
        &self.link
    }

    fn link_mut(&mut self) -> &mut LayerLink<'a> {
        &mut self.link
    }

    fn header_len(&self) -> usize {
        self.link.view().len()
    }

    fn describe(&self) -> String {
        format!("Pad bytes: {}", self.to_hex())
    }
}

/// Constructor entry for the dispatcher map. Never fails.
pub fn construct<'a>(
    view: BufferView<'a>,
    prev: Option<Predecessor>,
) -> Result<BoxedLayer<'a>, LayerError> {
    Ok(Box::new(TrailerLayer::new(view, prev)))
}
