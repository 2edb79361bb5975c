//! Checked zero-copy reinterpretation of mapped bytes as f32

use crate::error::{Error, Result};

/// Reinterpret a read-only byte span as a span of `f32` without copying.
///
/// The returned slice covers the same storage as `bytes`, so it is valid
/// exactly as long as the source is. Checks the byte length first, then the
/// start address; both must be 4-byte multiples. Calling this twice on the
/// same span yields an equivalent view.
pub fn cast_f32(bytes: &[u8]) -> Result<&[f32]> {
    if bytes.len() % 4 != 0 {
        return Err(Error::MisalignedLength { len: bytes.len() });
    }
    if bytes.is_empty() {
        // An empty span has no storage to reinterpret; its address is
        // meaningless and must not be alignment-checked.
        return Ok(&[]);
    }

    let addr = bytes.as_ptr() as usize;
    if addr % 4 != 0 {
        return Err(Error::MisalignedAddress { addr });
    }

    Ok(bytemuck::cast_slice(bytes))
}
