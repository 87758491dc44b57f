use bytes::Bytes;

use super::{document::RawBufferView, error::SceneError};

/// GL binding point a buffer view is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    ArrayBuffer,
    ElementArrayBuffer,
    Other(u32),
}

impl From<u32> for BufferTarget {
    fn from(code: u32) -> Self {
        match code {
            34962 => Self::ArrayBuffer,
            34963 => Self::ElementArrayBuffer,
            other => Self::Other(other),
        }
    }
}

/// A bounds-checked byte range of a buffer.
#[derive(Debug, Clone)]
pub struct BufferView {
    pub id: String,
    pub buffer: String,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
    pub target: Option<BufferTarget>,
    data: Bytes,
}

impl BufferView {
    pub fn new(id: &str, raw: &RawBufferView, buffer: &Bytes) -> Result<Self, SceneError> {
        let end = raw
            .byte_offset
            .checked_add(raw.byte_length)
            .filter(|end| *end <= buffer.len())
            .ok_or_else(|| {
                SceneError::out_of_bounds(
                    "bufferView",
                    id,
                    format!(
                        "range {}..{} exceeds buffer of {} bytes",
                        raw.byte_offset,
                        raw.byte_offset.saturating_add(raw.byte_length),
                        buffer.len()
                    ),
                )
            })?;

        Ok(Self {
            id: id.to_string(),
            buffer: raw.buffer.id(),
            byte_offset: raw.byte_offset,
            byte_length: raw.byte_length,
            byte_stride: raw.byte_stride.filter(|stride| *stride > 0),
            target: raw.target.map(BufferTarget::from),
            data: buffer.slice(raw.byte_offset..end),
        })
    }

    /// The bytes covered by this view.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
