//! Surface descriptions handed to the blit core.
//!
//! A [`SurfaceInfo`] is built by the caller's destination/rotation
//! preprocessing and is read-only for the duration of one blit call.

use gc2d_regs as regs;

/// Cardinal rotation of a surface.
///
/// Only the four right angles exist in hardware; arbitrary angles are
/// unrepresentable by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Source and destination are orthogonal when their angles differ by an
    /// odd multiple of 90 degrees, swapping width and height between them.
    pub fn is_orthogonal_to(self, other: Rotation) -> bool {
        (self as u32) % 2 != (other as u32) % 2
    }

    /// True when `dst` trails `self` by exactly 270 degrees.
    pub fn trails_by_270(self, dst: Rotation) -> bool {
        (self as u32 + 3) % 4 == dst as u32
    }

    pub fn hw_code(self) -> u32 {
        regs::ROT_ENCODING[self as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mirror {
    #[default]
    None,
    MirrorX,
    MirrorY,
    MirrorXy,
}

impl Mirror {
    pub fn hw_code(self) -> u32 {
        match self {
            Mirror::None => regs::MIRROR_NONE,
            Mirror::MirrorX => regs::MIRROR_X,
            Mirror::MirrorY => regs::MIRROR_Y,
            Mirror::MirrorXy => regs::MIRROR_XY,
        }
    }
}

/// Device-coordinate rectangle, edges exclusive on the right/bottom.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// The rectangle translated by `(-dx, -dy)`.
    pub fn offset_back(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            left: self.left - dx,
            top: self.top - dy,
            right: self.right - dx,
            bottom: self.bottom - dy,
        }
    }
}

/// Pixel format as the DE decodes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelFormat {
    pub code: u32,
    pub swizzle: u32,
    pub bits_per_pixel: u32,
    pub premultiplied: bool,
}

impl PixelFormat {
    pub const A8R8G8B8: PixelFormat = PixelFormat {
        code: regs::DE_FORMAT_A8R8G8B8,
        swizzle: regs::DE_SWIZZLE_ARGB,
        bits_per_pixel: 32,
        premultiplied: false,
    };

    pub const R5G6B5: PixelFormat = PixelFormat {
        code: regs::DE_FORMAT_R5G6B5,
        swizzle: regs::DE_SWIZZLE_ARGB,
        bits_per_pixel: 16,
        premultiplied: false,
    };

    /// Planar YUV 4:2:0: 8bpp luma plane followed by an interleaved chroma
    /// plane at half vertical resolution.
    pub const NV12: PixelFormat = PixelFormat {
        code: regs::DE_FORMAT_NV12,
        swizzle: regs::DE_SWIZZLE_ARGB,
        bits_per_pixel: 8,
        premultiplied: false,
    };

    pub fn is_nv12(&self) -> bool {
        self.code == regs::DE_FORMAT_NV12
    }
}

/// Surface dimensions and row pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    /// Row pitch in bytes, including any padding the allocator added.
    pub virt_stride: u32,
}

/// Per-source blend configuration. Absence means blending is disabled for
/// that source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendConfig {
    pub src_global_alpha_mode: u32,
    pub dst_global_alpha_mode: u32,
    pub src_factor_mode: u32,
    pub src_color_reverse: bool,
    pub dst_factor_mode: u32,
    pub dst_color_reverse: bool,
    pub src_global_color: u32,
    pub dst_global_color: u32,
}

/// Opaque descriptor for a caller-owned buffer backing a surface.
///
/// The core never dereferences it; it is resolved to a device handle by the
/// mapping collaborator. `base_offset` is the byte offset of the surface base
/// within the underlying allocation and is what alignment queries key off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    pub id: u64,
    pub base_offset: u64,
    pub size: u64,
}

/// One surface of a blit request.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceInfo {
    pub geom: Geometry,
    pub format: PixelFormat,
    /// Source rectangle for sources; destination rectangle for destinations.
    pub rect: Rect,
    pub angle: Rotation,
    pub mirror: Mirror,
    /// Pre-computed base alignment of this surface, in pixels/bytes. For a
    /// destination this is folded into the resolved destination shift.
    pub pix_align: i32,
    pub byte_align: i32,
    /// Post-alignment physical size, valid for destinations.
    pub phys_width: u32,
    pub phys_height: u32,
    pub blend: Option<BlendConfig>,
    pub rop: u8,
    pub buf: BufferDesc,
    /// Ordinal of this surface within the caller's request, used for
    /// diagnostics only; the multi-source slot is chosen by the batch.
    pub index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthogonality_is_angle_parity() {
        assert!(Rotation::Deg0.is_orthogonal_to(Rotation::Deg90));
        assert!(Rotation::Deg270.is_orthogonal_to(Rotation::Deg180));
        assert!(!Rotation::Deg0.is_orthogonal_to(Rotation::Deg180));
        assert!(!Rotation::Deg90.is_orthogonal_to(Rotation::Deg270));
    }

    #[test]
    fn trailing_270_pairs() {
        assert!(Rotation::Deg90.trails_by_270(Rotation::Deg0));
        assert!(Rotation::Deg0.trails_by_270(Rotation::Deg270));
        assert!(!Rotation::Deg0.trails_by_270(Rotation::Deg90));
        assert!(!Rotation::Deg180.trails_by_270(Rotation::Deg180));
    }

    #[test]
    fn nv12_is_planar_8bpp() {
        assert!(PixelFormat::NV12.is_nv12());
        assert_eq!(PixelFormat::NV12.bits_per_pixel, 8);
        assert!(!PixelFormat::A8R8G8B8.is_nv12());
    }
}
