use tracing::warn;

use super::layout;
use super::reader::{self, EtherCatReader};
use crate::error::LayerError;
use crate::layer::{BoxedLayer, Layer, LayerLink, OsiLayer, Predecessor, Protocol};
use crate::protocols::trailer::TrailerLayer;
use crate::view::BufferView;

/// EtherCAT frame: a 2-byte header whose low 11 bits give the length of the
/// datagrams that follow it.
///
/// By convention the layer's header covers the whole declared frame; any
/// bytes after it are padding and become a [`TrailerLayer`].
#[derive(Debug)]
pub struct EtherCatLayer<'a> {
    link: LayerLink<'a>,
    header_word: u16,
}

impl<'a> EtherCatLayer<'a> {
    pub fn new(view: BufferView<'a>, prev: Option<Predecessor>) -> Result<Self, LayerError> {
        let reader = EtherCatReader::new(view);
        reader.require_header()?;
        let header_word = reader.read_header_word()?;
        Ok(Self {
            link: LayerLink::new(view, prev),
            header_word,
        })
    }

    pub fn header_word(&self) -> u16 {
        self.header_word
    }

    pub fn data_length(&self) -> u16 {
        reader::data_length(self.header_word)
    }

    pub fn reserved(&self) -> bool {
        self.header_word & layout::RESERVED_MASK != 0
    }

    pub fn frame_type(&self) -> u8 {
        reader::frame_type(self.header_word)
    }

    /// Header plus declared data length, whether or not it was captured.
    pub fn declared_len(&self) -> usize {
        reader::declared_len(self.header_word)
    }

    /// True when the declared length runs past the end of the buffer.
    pub fn is_truncated(&self) -> bool {
        self.declared_len() > self.link.view().len()
    }

    /// Datagram bytes after the fixed header, clamped to what was captured.
    pub fn payload(&self) -> BufferView<'a> {
        let view = self.link.view();
        let end = self.declared_len().min(view.len());
        let len = end.saturating_sub(layout::HEADER_LEN);
        view.subview(layout::HEADER_LEN, len)
            .unwrap_or_else(|_| view.tail_clamped(view.len()))
    }
}

impl<'a> Layer<'a> for EtherCatLayer<'a> {
    fn protocol(&self) -> Protocol {
        Protocol::EtherCat
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
        self.declared_len()
    }

    fn parse_next(&mut self) -> Result<(), LayerError> {
        let view = self.link.view();
        let total = self.declared_len();
        if total > view.len() {
            warn!(
                protocol = %Protocol::EtherCat,
                offset = view.start(),
                declared = total,
                available = view.len(),
                "declared length exceeds available bytes"
            );
            return Err(LayerError::Malformed {
                protocol: Protocol::EtherCat,
                needed: total,
                actual: view.len(),
            });
        }
        if total == view.len() {
            return Ok(());
        }
        let padding = view.tail(total)?;
        let prev = self.as_predecessor();
        self.link
            .attach(Box::new(TrailerLayer::new(padding, Some(prev))));
        Ok(())
    }

    fn describe(&self) -> String {
        format!("EtherCAT Layer, Data length: {} bytes", self.declared_len())
    }
}

pub fn construct<'a>(
    view: BufferView<'a>,
    prev: Option<Predecessor>,
) -> Result<BoxedLayer<'a>, LayerError> {
    Ok(Box::new(EtherCatLayer::new(view, prev)?))
}

pub fn is_ethercat_ethertype(ether_type: u16) -> bool {
    ether_type == layout::ETHERCAT_ETHERTYPE
}

pub fn is_data_valid(data: &[u8]) -> bool {
    data.len() >= layout::HEADER_LEN
}
