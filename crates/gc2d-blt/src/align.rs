//! Alignment and geometry resolution for one source/destination pair.
//!
//! The resolver maps the destination-relative blit origin back into source
//! surface pixel space for each rotation, converts the result to a byte
//! shift, folds in the hardware base-address alignment correction, and
//! decides whether the source can share a multi-source batch or needs
//! single-source addressing.

use tracing::debug;

use crate::batch::DestState;
use crate::services::BltServices;
use crate::surface::{Rotation, SurfaceInfo};

/// Resolver output for one source. Everything downstream (batch compatibility
/// checks, record emission) is driven by this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceSetup {
    /// Multi-source addressing; false forces a single-source batch.
    pub multi_src: bool,
    /// Source and destination angles differ by an odd multiple of 90°.
    pub orthogonal: bool,
    /// Byte distance from the source buffer base to the blit origin,
    /// alignment correction included. Recorded as a fixup on the source
    /// address field.
    pub src_byte_shift: i32,
    /// Source pixel origin. Zero under multi-source addressing, which is
    /// relative to the destination rectangle.
    pub src_left: i32,
    pub src_top: i32,
    /// Physical (post-alignment, rotation-swapped) source surface size.
    pub src_surf_width: u32,
    pub src_surf_height: u32,
    /// Destination byte shift derived from the destination's own alignment
    /// plus any rotation-coupled vertical component.
    pub dst_byte_shift: i32,
    /// Physical destination size after absorbing the source correction.
    pub dst_phys_width: u32,
    pub dst_phys_height: u32,
    /// Destination rectangle offset absorbing the source correction under
    /// multi-source addressing.
    pub dst_offset_x: i32,
    pub dst_offset_y: i32,
}

pub fn resolve_source(
    src: &SurfaceInfo,
    dest: &DestState,
    services: &impl BltServices,
) -> SourceSetup {
    let dstinfo = &dest.info;
    let adj = &dest.adjusted;

    let orthogonal = src.angle.is_orthogonal_to(dstinfo.angle);

    // Clipped source origin.
    let mut src_left = src.rect.left + dest.clip_delta.left;
    let mut src_top = src.rect.top + dest.clip_delta.top;

    let src_width = src.geom.width as i32;
    let src_height = src.geom.height as i32;

    // Map the destination-relative offset back into source pixel space,
    // pivoting on the source surface's own dimensions.
    let (mut src_shift_x, src_shift_y) = match src.angle {
        Rotation::Deg0 => (src_left - adj.left, src_top - adj.top),
        Rotation::Deg90 => (
            src_top - adj.top,
            (src_width - src_left) - (dest.width - adj.left),
        ),
        Rotation::Deg180 => (
            (src_width - src_left) - (dest.width - adj.left),
            (src_height - src_top) - (dest.height - adj.top),
        ),
        Rotation::Deg270 => (
            (src_height - src_top) - (dest.height - adj.top),
            src_left - adj.left,
        ),
    };

    let src_bytes_pp = src.format.bits_per_pixel as i32 / 8;
    let mut src_byte_shift = src_shift_y * src.geom.virt_stride as i32 + src_shift_x * src_bytes_pp;

    // Correct for source base address misalignment.
    let mut src_align = services.pixel_offset(src, src_byte_shift);
    src_byte_shift += src_align * src_bytes_pp;
    src_shift_x += src_align;

    debug!(
        index = src.index,
        src_shift_x, src_shift_y, src_byte_shift, src_align, "source surface shift"
    );

    // Destination shift. The vertical component only applies when the
    // destination angle trails the source angle by exactly 270°.
    let dst_shift_x = dstinfo.pix_align;
    let dst_shift_y = if src.angle.trails_by_270(dstinfo.angle) {
        src_align
    } else {
        0
    };

    let dst_bytes_pp = dstinfo.format.bits_per_pixel as i32 / 8;
    let dst_byte_shift = dst_shift_y * dstinfo.geom.virt_stride as i32 + dst_shift_x * dst_bytes_pp;
    let dst_align = services.pixel_offset(dstinfo, dst_byte_shift);

    debug!(dst_shift_x, dst_shift_y, dst_byte_shift, dst_align, "destination surface shift");

    let single = src.format.is_nv12()
        || dst_align != 0
        || (src_align != 0 && src.angle == dstinfo.angle);

    if single {
        // Stand-alone source: realign against a zero shift baseline and
        // absorb the correction into the source origin and physical size.
        src_align = services.pixel_offset(src, 0);
        src_byte_shift = src_align * src_bytes_pp;

        let (src_surf_width, src_surf_height) = match src.angle {
            Rotation::Deg0 => {
                src_left -= src_align;
                (src_width - src_align, src_height)
            }
            Rotation::Deg90 => {
                src_top -= src_align;
                (src_height - src_align, src_width)
            }
            Rotation::Deg180 => (src_width - src_align, src_height),
            Rotation::Deg270 => (src_height - src_align, src_width),
        };

        debug!(
            src_left,
            src_top,
            src_surf_width,
            src_surf_height,
            dst_byte_align = dstinfo.byte_align,
            "single-source addressing"
        );

        SourceSetup {
            multi_src: false,
            orthogonal,
            src_byte_shift,
            src_left,
            src_top,
            src_surf_width: src_surf_width as u32,
            src_surf_height: src_surf_height as u32,
            dst_byte_shift,
            dst_phys_width: dstinfo.phys_width,
            dst_phys_height: dstinfo.phys_height,
            dst_offset_x: 0,
            dst_offset_y: 0,
        }
    } else {
        // Multi-source addressing is relative; the correction is folded into
        // a destination offset and physical-size shrink instead.
        let dst_upright = matches!(dstinfo.angle, Rotation::Deg0 | Rotation::Deg180);
        let physw = dstinfo.phys_width as i32;
        let physh = dstinfo.phys_height as i32;

        let (dst_offset_x, dst_offset_y, phys_width, phys_height) = match src.angle {
            Rotation::Deg0 => {
                if dst_upright {
                    (src_align, 0, physw - src_align, physh)
                } else {
                    (src_align, 0, physw, physh - src_align)
                }
            }
            Rotation::Deg90 => {
                if dst_upright {
                    (0, src_align, physw, physh - src_align)
                } else {
                    (0, src_align, physw - src_align, physh)
                }
            }
            Rotation::Deg180 => {
                if dst_upright {
                    (0, 0, physw - src_align, physh)
                } else {
                    (0, 0, physw, physh - src_align)
                }
            }
            Rotation::Deg270 => {
                if dst_upright {
                    (0, 0, physw, physh - src_align)
                } else {
                    (0, 0, physw - src_align, physh)
                }
            }
        };

        // Source geometry now matches the destination, swapped when the two
        // are orthogonal.
        let (src_surf_width, src_surf_height) = if orthogonal {
            (phys_height, phys_width)
        } else {
            (phys_width, phys_height)
        };

        debug!(
            dst_offset_x,
            dst_offset_y, phys_width, phys_height, "multi-source addressing"
        );

        SourceSetup {
            multi_src: true,
            orthogonal,
            src_byte_shift,
            src_left: 0,
            src_top: 0,
            src_surf_width: src_surf_width as u32,
            src_surf_height: src_surf_height as u32,
            dst_byte_shift,
            dst_phys_width: phys_width as u32,
            dst_phys_height: phys_height as u32,
            dst_offset_x,
            dst_offset_y,
        }
    }
}
