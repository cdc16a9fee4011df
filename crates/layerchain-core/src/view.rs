//! Bounded, non-owning windows into a capture buffer.
//!
//! A [`BufferView`] remembers the whole capture buffer plus a `start`/`len`
//! window. Reads are relative to the window and never reach past its end,
//! so a layer cannot observe bytes it was not handed. The borrow on the
//! underlying slice ties every view (and every layer holding one) to the
//! lifetime of the buffer.

use std::fmt;
use std::ops::Range;

use crate::error::ViewError;

#[derive(Clone, Copy)]
pub struct BufferView<'a> {
    buf: &'a [u8],
    start: usize,
    len: usize,
}

impl<'a> BufferView<'a> {
    /// Create a view of `len` bytes starting at `start` in `buf`.
    ///
    /// Fails with [`ViewError::OutOfBounds`] when the window would extend
    /// past the end of the buffer.
    pub fn new(buf: &'a [u8], start: usize, len: usize) -> Result<Self, ViewError> {
        let end = start.checked_add(len).ok_or(ViewError::OutOfBounds {
            offset: start,
            len,
            available: buf.len(),
        })?;
        if end > buf.len() {
            return Err(ViewError::OutOfBounds {
                offset: start,
                len,
                available: buf.len(),
            });
        }
        Ok(Self { buf, start, len })
    }

    /// View over the whole buffer.
    pub fn whole(buf: &'a [u8]) -> Self {
        Self {
            buf,
            start: 0,
            len: buf.len(),
        }
    }

    /// Absolute offset of the first byte within the capture buffer.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset one past the last byte of the view.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Length of the capture buffer this view points into.
    pub fn source_len(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf.get(self.start..self.end()).unwrap_or(&[])
    }

    pub fn require_len(&self, needed: usize) -> Result<(), ViewError> {
        if self.len < needed {
            return Err(ViewError::OutOfBounds {
                offset: 0,
                len: needed,
                available: self.len,
            });
        }
        Ok(())
    }

    /// Narrow the view to `len` bytes at the relative `offset`.
    pub fn subview(&self, offset: usize, len: usize) -> Result<Self, ViewError> {
        let end = offset.checked_add(len).ok_or(ViewError::OutOfBounds {
            offset,
            len,
            available: self.len,
        })?;
        if end > self.len {
            return Err(ViewError::OutOfBounds {
                offset,
                len,
                available: self.len,
            });
        }
        Ok(Self {
            buf: self.buf,
            start: self.start + offset,
            len,
        })
    }

    /// Everything from the relative `offset` to the end of the view.
    ///
    /// An offset equal to the view length yields an empty view.
    pub fn tail(&self, offset: usize) -> Result<Self, ViewError> {
        let len = self.len.checked_sub(offset).ok_or(ViewError::OutOfBounds {
            offset,
            len: 0,
            available: self.len,
        })?;
        self.subview(offset, len)
    }

    /// Like [`BufferView::tail`], but an offset past the end yields an empty
    /// view positioned at the end instead of an error.
    pub fn tail_clamped(&self, offset: usize) -> Self {
        let offset = offset.min(self.len);
        Self {
            buf: self.buf,
            start: self.start + offset,
            len: self.len - offset,
        }
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], ViewError> {
        let len = range.end.saturating_sub(range.start);
        if range.start > range.end || range.end > self.len {
            return Err(ViewError::OutOfBounds {
                offset: range.start,
                len,
                available: self.len,
            });
        }
        self.as_bytes().get(range.clone()).ok_or(ViewError::OutOfBounds {
            offset: range.start,
            len,
            available: self.len,
        })
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, ViewError> {
        self.as_bytes()
            .get(offset)
            .copied()
            .ok_or(ViewError::OutOfBounds {
                offset,
                len: 1,
                available: self.len,
            })
    }

    pub fn read_u16_be(&self, offset: usize) -> Result<u16, ViewError> {
        self.read_array::<2>(offset).map(u16::from_be_bytes)
    }

    pub fn read_u16_le(&self, offset: usize) -> Result<u16, ViewError> {
        self.read_array::<2>(offset).map(u16::from_le_bytes)
    }

    pub fn read_u32_be(&self, offset: usize) -> Result<u32, ViewError> {
        self.read_array::<4>(offset).map(u32::from_be_bytes)
    }

    fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], ViewError> {
        let end = offset.checked_add(N).ok_or(ViewError::OutOfBounds {
            offset,
            len: N,
            available: self.len,
        })?;
        let bytes = self.read_slice(offset..end)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Lowercase hexadecimal rendering of the viewed bytes, two digits per byte.
    pub fn to_hex(&self) -> String {
        self.as_bytes().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for BufferView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferView")
            .field("start", &self.start)
            .field("len", &self.len)
            .finish()
    }
}

impl PartialEq for BufferView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for BufferView<'_> {}
