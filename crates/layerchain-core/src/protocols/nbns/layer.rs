use super::layout;
use super::reader::NbnsReader;
use crate::error::LayerError;
use crate::layer::{BoxedLayer, Layer, LayerLink, OsiLayer, Predecessor, Protocol};
use crate::view::BufferView;

/// NetBIOS Name Service message. Always the last layer of a chain: the
/// question and resource record sections are exposed as raw bytes, not
/// decomposed further.
#[derive(Debug)]
pub struct NbnsLayer<'a> {
    link: LayerLink<'a>,
    transaction_id: u16,
    flags: u16,
}

impl<'a> NbnsLayer<'a> {
    pub fn new(view: BufferView<'a>, prev: Option<Predecessor>) -> Result<Self, LayerError> {
        let reader = NbnsReader::new(view);
        reader.require_header()?;
        let transaction_id = reader.read_transaction_id()?;
        let flags = reader.read_flags()?;
        Ok(Self {
            link: LayerLink::new(view, prev),
            transaction_id,
            flags,
        })
    }

    pub fn transaction_id(&self) -> u16 {
        self.transaction_id
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn is_response(&self) -> bool {
        self.flags & layout::RESPONSE_MASK != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.flags >> layout::OPCODE_SHIFT) & layout::OPCODE_MASK) as u8
    }

    pub fn nm_flags(&self) -> u8 {
        ((self.flags >> layout::NM_FLAGS_SHIFT) & layout::NM_FLAGS_MASK) as u8
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & layout::RCODE_MASK) as u8
    }

    pub fn question_count(&self) -> Option<u16> {
        self.reader().read_optional_count(layout::QDCOUNT_OFFSET)
    }

    pub fn answer_count(&self) -> Option<u16> {
        self.reader().read_optional_count(layout::ANCOUNT_OFFSET)
    }

    pub fn authority_count(&self) -> Option<u16> {
        self.reader().read_optional_count(layout::NSCOUNT_OFFSET)
    }

    pub fn additional_count(&self) -> Option<u16> {
        self.reader().read_optional_count(layout::ARCOUNT_OFFSET)
    }

    /// Records after the full 12-byte header, or after the 4 required bytes
    /// when the message is shorter than that.
    pub fn body(&self) -> BufferView<'a> {
        let view = self.link.view();
        if view.len() >= layout::FULL_HEADER_LEN {
            view.tail_clamped(layout::FULL_HEADER_LEN)
        } else {
            view.tail_clamped(layout::MIN_HEADER_LEN)
        }
    }

    fn reader(&self) -> NbnsReader<'a> {
        NbnsReader::new(self.link.view())
    }
}

impl<'a> Layer<'a> for NbnsLayer<'a> {
    fn protocol(&self) -> Protocol {
        Protocol::Nbns
    }

    fn osi_layer(&self) -> OsiLayer {
        OsiLayer::Application
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
        "NetBIOS Name Service layer".to_string()
    }
}

pub fn construct<'a>(
    view: BufferView<'a>,
    prev: Option<Predecessor>,
) -> Result<BoxedLayer<'a>, LayerError> {
    Ok(Box::new(NbnsLayer::new(view, prev)?))
}

pub fn is_nbns_port(port: u16) -> bool {
    port == layout::NBNS_PORT
}

pub fn is_data_valid(data: &[u8]) -> bool {
    data.len() >= layout::MIN_HEADER_LEN
}
