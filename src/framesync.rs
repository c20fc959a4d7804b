use crate::types::{ObjectTransforms, PerFrameConstants, OBJECT_STRIDE, PER_FRAME_STRIDE};

/// Round `size` up to the next multiple of `alignment`.
pub const fn align_up(size: usize, alignment: usize) -> usize {
    (size + alignment - 1) / alignment * alignment
}

/// Byte layout of one constant-buffer slot: the per-frame block at offset 0,
/// then one transform block per object.
///
/// All offsets derive from the padded strides, never from raw field sizes;
/// an offset that ignores padding lands mid-struct on the GPU side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    object_count: usize,
}

impl BufferLayout {
    pub fn new(object_count: usize) -> Self {
        Self { object_count }
    }

    pub const fn per_frame_offset() -> usize {
        0
    }

    pub fn object_offset(&self, index: usize) -> usize {
        assert!(
            index < self.object_count,
            "object index {index} out of range for layout of {}",
            self.object_count
        );
        PER_FRAME_STRIDE + index * OBJECT_STRIDE
    }

    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Total slot length in bytes.
    pub fn len(&self) -> usize {
        PER_FRAME_STRIDE + self.object_count * OBJECT_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One entry of the in-flight ring: a CPU-writable byte region plus a write
/// cursor.
///
/// A slot is written by the producer before submission and read by the GPU
/// after; the frame gate guarantees the prior read has retired before the
/// slot is written again.
pub struct FrameSlot {
    layout: BufferLayout,
    bytes: Vec<u8>,
    cursor: usize,
}

impl FrameSlot {
    pub fn new(layout: BufferLayout) -> Self {
        Self {
            layout,
            bytes: vec![0; layout.len()],
            cursor: 0,
        }
    }

    /// Rewind the write cursor for a fresh frame.
    pub fn begin(&mut self) {
        self.cursor = 0;
    }

    /// Write the per-frame block. Must be the first write after `begin`.
    /// Returns the byte offset the block landed at.
    pub fn write_per_frame(&mut self, constants: &PerFrameConstants) -> usize {
        assert_eq!(self.cursor, 0, "per-frame constants must be packed first");
        self.write_bytes(bytemuck::bytes_of(constants), PER_FRAME_STRIDE)
    }

    /// Append one object's transform block at the cursor. Returns the byte
    /// offset the block landed at.
    pub fn write_object(&mut self, transforms: &ObjectTransforms) -> usize {
        assert!(
            self.cursor >= PER_FRAME_STRIDE,
            "object transforms must follow the per-frame block"
        );
        self.write_bytes(bytemuck::bytes_of(transforms), OBJECT_STRIDE)
    }

    fn write_bytes(&mut self, data: &[u8], stride: usize) -> usize {
        let offset = self.cursor;
        assert!(
            offset + stride <= self.bytes.len(),
            "slot overflow: write of {stride} bytes at {offset} into {}",
            self.bytes.len()
        );
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        self.cursor = offset + stride;
        offset
    }

    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    /// The packed region handed to the draw-submission collaborator.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
