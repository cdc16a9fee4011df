use super::layout;
use crate::error::LayerError;
use crate::layer::Protocol;
use crate::view::BufferView;

pub struct EtherCatReader<'a> {
    view: BufferView<'a>,
}

impl<'a> EtherCatReader<'a> {
    pub fn new(view: BufferView<'a>) -> Self {
        Self { view }
    }

    pub fn require_header(&self) -> Result<(), LayerError> {
        if self.view.len() < layout::HEADER_LEN {
            return Err(LayerError::Malformed {
                protocol: Protocol::EtherCat,
                needed: layout::HEADER_LEN,
                actual: self.view.len(),
            });
        }
        Ok(())
    }

    pub fn read_header_word(&self) -> Result<u16, LayerError> {
        Ok(self.view.read_u16_le(layout::HEADER_WORD_OFFSET)?)
    }
}

pub fn data_length(word: u16) -> u16 {
    word & layout::LENGTH_MASK
}

pub fn frame_type(word: u16) -> u8 {
    (word >> layout::TYPE_SHIFT) as u8
}

/// Declared frame length: length subfield plus the fixed header.
pub fn declared_len(word: u16) -> usize {
    usize::from(data_length(word)) + layout::HEADER_LEN
}

#[cfg(test)]
mod tests {
    use super::{EtherCatReader, data_length, declared_len, frame_type};
    use crate::error::LayerError;
    use crate::view::BufferView;

    #[test]
    fn header_word_is_little_endian() {
        let buf = [0x05, 0x10];
        let reader = EtherCatReader::new(BufferView::whole(&buf));
        let word = reader.read_header_word().unwrap();
        assert_eq!(word, 0x1005);
        assert_eq!(data_length(word), 5);
        assert_eq!(frame_type(word), 1);
    }

    #[test]
    fn declared_len_masks_upper_bits() {
        assert_eq!(declared_len(0xffff), 0x07ff + 2);
        assert_eq!(declared_len(0x0005), 7);
    }

    #[test]
    fn require_header_reports_malformed() {
        let buf = [0x05];
        let reader = EtherCatReader::new(BufferView::whole(&buf));
        let err = reader.require_header().unwrap_err();
        assert!(matches!(
            err,
            LayerError::Malformed {
                needed: 2,
                actual: 1,
                ..
            }
        ));
    }
}
