//! Shared fixtures for `gc2d-blt` integration tests.

#![allow(dead_code)]

use gc2d_blt::{
    BufferDesc, DestState, Geometry, Mirror, PixelFormat, Rect, Rotation, SurfaceInfo,
};

/// Hardware addressing granularity used by the test services.
pub const GRANULARITY: u32 = 16;

/// A 128x96 ARGB8888 surface with an 8,4..72,68 rectangle.
pub fn argb_surface(id: u64, base_offset: u64, angle: Rotation) -> SurfaceInfo {
    SurfaceInfo {
        geom: Geometry {
            width: 128,
            height: 96,
            virt_stride: 512,
        },
        format: PixelFormat::A8R8G8B8,
        rect: Rect::new(8, 4, 72, 68),
        angle,
        mirror: Mirror::None,
        pix_align: 0,
        byte_align: 0,
        phys_width: 128,
        phys_height: 96,
        blend: None,
        rop: 0xCC,
        buf: BufferDesc {
            id,
            base_offset,
            size: 0x10_0000,
        },
        index: 0,
    }
}

pub fn dest_state(id: u64, base_offset: u64, angle: Rotation) -> DestState {
    DestState {
        info: argb_surface(id, base_offset, angle),
        adjusted: Rect::new(8, 4, 72, 68),
        clip_delta: Rect::default(),
        width: 128,
        height: 96,
    }
}

/// Count word-aligned occurrences of `word` in the command stream. Load-state
/// words are distinctive enough to identify record kinds.
pub fn count_words(bytes: &[u8], word: u32) -> usize {
    bytes
        .chunks_exact(4)
        .filter(|c| u32::from_le_bytes((*c).try_into().unwrap()) == word)
        .count()
}
