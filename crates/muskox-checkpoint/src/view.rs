//! Non-owning typed views into the mapped payload

use crate::region::MappedRegion;

/// A read-only `f32` view of one tensor inside the mapped payload.
///
/// Holds its own handle to the mapping, so the view can never dangle: the
/// OS mapping stays alive until every view (and the checkpoint itself) has
/// been dropped. Views are cheap to clone and never alias mutably.
#[derive(Debug, Clone)]
pub struct TensorView {
    region: MappedRegion,
    byte_start: usize,
    elements: usize,
}

impl TensorView {
    /// Invariant upheld by `Checkpoint::view`: the byte range is in bounds
    /// and `byte_start` is 4-aligned relative to the mapping base.
    pub(crate) fn new(region: MappedRegion, byte_start: usize, elements: usize) -> Self {
        Self {
            region,
            byte_start,
            elements,
        }
    }

    /// The tensor data as a flat `f32` slice.
    pub fn as_f32(&self) -> &[f32] {
        let bytes = &self.region.as_bytes()[self.byte_start..self.byte_start + self.elements * 4];
        bytemuck::cast_slice(bytes)
    }

    /// Number of `f32` elements in this view.
    pub fn len(&self) -> usize {
        self.elements
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.elements == 0
    }

    /// Number of live handles to the underlying mapping, counting this one.
    pub fn mapping_refs(&self) -> usize {
        self.region.handle_count()
    }
}
