use super::layout;
use crate::error::LayerError;
use crate::layer::Protocol;
use crate::view::BufferView;

pub struct NbnsReader<'a> {
    view: BufferView<'a>,
}

impl<'a> NbnsReader<'a> {
    pub fn new(view: BufferView<'a>) -> Self {
        Self { view }
    }

    pub fn require_header(&self) -> Result<(), LayerError> {
        if self.view.len() < layout::MIN_HEADER_LEN {
            return Err(LayerError::Malformed {
                protocol: Protocol::Nbns,
                needed: layout::MIN_HEADER_LEN,
                actual: self.view.len(),
            });
        }
        Ok(())
    }

    pub fn read_transaction_id(&self) -> Result<u16, LayerError> {
        Ok(self.view.read_u16_be(layout::TRANSACTION_ID_OFFSET)?)
    }

    pub fn read_flags(&self) -> Result<u16, LayerError> {
        Ok(self.view.read_u16_be(layout::FLAGS_OFFSET)?)
    }

    /// Section counts are optional: `None` when the view stops before them.
    pub fn read_optional_count(&self, offset: usize) -> Option<u16> {
        self.view.read_u16_be(offset).ok()
    }
}
