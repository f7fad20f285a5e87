//! Append-only command buffer and deferred address fixups.
//!
//! The buffer is an arena of fixed-layout records: `claim` reserves space
//! forward-only and returns a byte offset, after which individual fields are
//! written with `offset_of!`-derived offsets. Nothing is ever rewritten or
//! withdrawn once claimed.

use crate::error::{BltError, Result};

/// Deferred relocation: the device address written at `field_offset` must be
/// adjusted by `byte_shift` once the buffer's final placement is known.
///
/// Fixups are consumed by the mapping/submission subsystem, never by this
/// core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fixup {
    pub field_offset: usize,
    pub byte_shift: i32,
}

/// Fixed-capacity command buffer for one submission.
#[derive(Debug)]
pub struct CommandBuffer {
    buf: Vec<u8>,
    capacity: usize,
    fixups: Vec<Fixup>,
}

impl CommandBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            fixups: Vec::new(),
        }
    }

    /// Reserve `size` bytes of zeroed record space contiguous with previous
    /// claims. Returns the byte offset of the claimed region.
    pub fn claim(&mut self, size: usize) -> Result<usize> {
        debug_assert_eq!(size % 4, 0, "records are word sequences");

        let offset = self.buf.len();
        let remaining = self.capacity - offset;
        if size > remaining {
            return Err(BltError::OutOfSpace {
                need: size,
                remaining,
            });
        }
        self.buf.resize(offset + size, 0);
        Ok(offset)
    }

    pub fn write_u32_at(&mut self, offset: usize, v: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn read_u32_at(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.buf[offset..offset + 4].try_into().unwrap())
    }

    /// Record that the address field at `field_offset` needs `byte_shift`
    /// added once the device address is resolved.
    pub fn add_fixup(&mut self, field_offset: usize, byte_shift: i32) {
        self.fixups.push(Fixup {
            field_offset,
            byte_shift,
        });
    }

    pub fn fixups(&self) -> &[Fixup] {
        &self.fixups
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }
}
