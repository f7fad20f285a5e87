//! Collaborator seam: buffer mapping and base-address alignment queries.

use std::collections::HashMap;

use crate::error::{BltError, Result};
use crate::surface::{BufferDesc, SurfaceInfo};

/// Device-addressable handle for a mapped buffer, written verbatim into
/// address fields of command records (relocation happens downstream via the
/// fixup list).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceHandle(pub u32);

/// Services the command core consumes but does not own.
pub trait BltServices {
    /// Resolve an opaque buffer descriptor to a device handle. Failures must
    /// carry a diagnostic string.
    fn map(&mut self, desc: &BufferDesc) -> Result<DeviceHandle>;

    /// Pixel count to add to a surface's geometry so that its base address at
    /// `byte_shift` satisfies the engine's addressing granularity. Pure: the
    /// same inputs always produce the same correction.
    fn pixel_offset(&self, surf: &SurfaceInfo, byte_shift: i32) -> i32;
}

/// Deterministic in-process implementation backed by a handle table and a
/// fixed addressing granularity.
///
/// Doubles as the test harness for the core: descriptors are mapped on first
/// use and remembered, and the alignment query derives the correction from
/// the descriptor's `base_offset`.
#[derive(Debug)]
pub struct SoftServices {
    granularity: u32,
    handles: HashMap<u64, DeviceHandle>,
    next_handle: u32,
    pub map_calls: u64,
}

impl SoftServices {
    pub fn new(granularity: u32) -> Self {
        assert!(granularity.is_power_of_two());
        Self {
            granularity,
            handles: HashMap::new(),
            next_handle: 0x1000_0000,
            map_calls: 0,
        }
    }
}

impl BltServices for SoftServices {
    fn map(&mut self, desc: &BufferDesc) -> Result<DeviceHandle> {
        self.map_calls += 1;
        if desc.size == 0 {
            return Err(BltError::Map {
                id: desc.id,
                reason: "zero-sized buffer".into(),
            });
        }
        let next = &mut self.next_handle;
        let handle = *self.handles.entry(desc.id).or_insert_with(|| {
            let h = DeviceHandle(*next);
            *next += 0x100;
            h
        });
        Ok(handle)
    }

    fn pixel_offset(&self, surf: &SurfaceInfo, byte_shift: i32) -> i32 {
        let g = self.granularity as i64;
        let addr = surf.buf.base_offset as i64 + byte_shift as i64;
        let misalign = addr.rem_euclid(g);
        if misalign == 0 {
            return 0;
        }
        // Walk the base forward to the next granularity boundary and report
        // the distance in whole pixels.
        let bytes_per_pixel = (surf.format.bits_per_pixel / 8).max(1) as i64;
        ((g - misalign) / bytes_per_pixel) as i32
    }
}
