//! Memory-mapped checkpoint access
//!
//! A [`Checkpoint`] owns the mapping for one checkpoint file, skips the
//! container header, and exposes the remaining bytes as a flat `f32`
//! payload. The header itself is parsed by an external collaborator; this
//! module only needs the byte offset at which the payload begins.

use std::path::Path;
use tracing::info;

use crate::cast::cast_f32;
use crate::error::{Error, Result};
use crate::region::MappedRegion;
use crate::view::TensorView;

/// A mapped checkpoint file with a validated `f32` payload.
#[derive(Debug)]
pub struct Checkpoint {
    region: MappedRegion,
    /// Byte offset of the payload within the file.
    data_offset: usize,
    /// Payload length in `f32` elements.
    payload_elements: usize,
}

impl Checkpoint {
    /// Map the checkpoint at `path` and locate the tensor payload.
    ///
    /// `data_offset` is the container header length in bytes, produced by
    /// the external header parser. The payload spanning `data_offset` to
    /// the end of the file is validated once here; all later view access
    /// is infallible.
    pub fn open<P: AsRef<Path>>(path: P, data_offset: u64) -> Result<Self> {
        let path = path.as_ref();
        let region = MappedRegion::open(path)?;

        let file_size = region.len();
        if data_offset > file_size as u64 {
            return Err(Error::OffsetOutOfBounds {
                offset: data_offset,
                file_size,
            });
        }
        let data_offset = data_offset as usize;

        let payload = cast_f32(&region.as_bytes()[data_offset..])?;
        let payload_elements = payload.len();

        info!(
            path = %path.display(),
            file_size,
            data_offset,
            payload_elements,
            "opened checkpoint"
        );

        Ok(Self {
            region,
            data_offset,
            payload_elements,
        })
    }

    /// The full payload as a flat `f32` slice.
    pub fn payload(&self) -> &[f32] {
        // Length and alignment were validated in `open`; the mapping's base
        // address does not move, so this cast cannot fail afterwards.
        bytemuck::cast_slice(&self.region.as_bytes()[self.data_offset..])
    }

    /// Payload length in `f32` elements.
    pub fn payload_elements(&self) -> usize {
        self.payload_elements
    }

    /// Total size of the mapped file in bytes.
    pub fn file_size(&self) -> usize {
        self.region.len()
    }

    /// Byte offset at which the payload begins.
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    /// Number of live handles to the underlying mapping.
    pub fn mapping_refs(&self) -> usize {
        self.region.handle_count()
    }

    /// Create a view of `len` elements starting `start` elements into the
    /// payload. The view keeps the mapping alive on its own.
    pub fn view(&self, start: usize, len: usize) -> Result<TensorView> {
        let in_bounds = start
            .checked_add(len)
            .is_some_and(|end| end <= self.payload_elements);
        if !in_bounds {
            return Err(Error::ViewOutOfBounds {
                start,
                len,
                payload: self.payload_elements,
            });
        }

        Ok(TensorView::new(
            self.region.clone(),
            self.data_offset + start * 4,
            len,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_checkpoint(header: &[u8], floats: &[f32]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(header).unwrap();
        file.write_all(bytemuck::cast_slice(floats)).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn opens_payload_after_header() {
        let floats = [0.5f32, 1.5, 2.5];
        let file = write_checkpoint(&[0u8; 8], &floats);

        let ckpt = Checkpoint::open(file.path(), 8).unwrap();
        assert_eq!(ckpt.payload_elements(), 3);
        assert_eq!(ckpt.data_offset(), 8);
        assert_eq!(ckpt.payload(), &floats);
    }

    #[test]
    fn rejects_offset_past_eof() {
        let file = write_checkpoint(&[], &[1.0, 2.0]);
        match Checkpoint::open(file.path(), 64) {
            Err(Error::OffsetOutOfBounds {
                offset: 64,
                file_size: 8,
            }) => {}
            other => panic!("expected OffsetOutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn rejects_ragged_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 10]).unwrap();
        file.flush().unwrap();

        match Checkpoint::open(file.path(), 0) {
            Err(Error::MisalignedLength { len: 10 }) => {}
            other => panic!("expected MisalignedLength, got {other:?}"),
        }
    }

    #[test]
    fn unaligned_header_skip_is_rejected() {
        // A 5-byte header leaves the payload off the 4-byte grid.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 5]).unwrap();
        file.write_all(bytemuck::cast_slice(&[1.0f32, 2.0])).unwrap();
        file.flush().unwrap();

        match Checkpoint::open(file.path(), 5) {
            Err(Error::MisalignedAddress { .. }) => {}
            other => panic!("expected MisalignedAddress, got {other:?}"),
        }
    }

    #[test]
    fn views_keep_mapping_alive() {
        let file = write_checkpoint(&[], &[1.0, 2.0, 3.0, 4.0]);
        let ckpt = Checkpoint::open(file.path(), 0).unwrap();

        let view = ckpt.view(1, 2).unwrap();
        assert_eq!(ckpt.mapping_refs(), 2);
        assert_eq!(view.as_f32(), &[2.0, 3.0]);

        drop(view);
        assert_eq!(ckpt.mapping_refs(), 1);
    }

    #[test]
    fn view_bounds_are_checked() {
        let file = write_checkpoint(&[], &[1.0, 2.0]);
        let ckpt = Checkpoint::open(file.path(), 0).unwrap();

        assert!(ckpt.view(0, 2).is_ok());
        match ckpt.view(1, 2) {
            Err(Error::ViewOutOfBounds {
                start: 1,
                len: 2,
                payload: 2,
            }) => {}
            other => panic!("expected ViewOutOfBounds, got {other:?}"),
        }
        match ckpt.view(usize::MAX, 2) {
            Err(Error::ViewOutOfBounds { .. }) => {}
            other => panic!("expected ViewOutOfBounds, got {other:?}"),
        }
    }
}
