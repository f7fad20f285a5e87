//! NV12 chroma plane addressing and the planar single-source restriction.

mod common;

use common::{count_words, dest_state, GRANULARITY};
use gc2d_blt::{
    do_blit, Batch, BufferDesc, CommandBuffer, Geometry, Mirror, PixelFormat, Rect, Rotation,
    SoftServices, SurfaceInfo,
};
use gc2d_regs as regs;
use pretty_assertions::assert_eq;

/// 800x600 NV12 frame with rows padded out to a 1024-byte stride.
fn nv12_surface(base_offset: u64, angle: Rotation) -> SurfaceInfo {
    SurfaceInfo {
        geom: Geometry {
            width: 800,
            height: 600,
            virt_stride: 1024,
        },
        format: PixelFormat::NV12,
        rect: Rect::new(0, 0, 64, 64),
        angle,
        mirror: Mirror::None,
        pix_align: 0,
        byte_align: 0,
        phys_width: 800,
        phys_height: 600,
        blend: None,
        rop: 0xCC,
        buf: BufferDesc {
            id: 42,
            base_offset,
            size: 0x100_0000,
        },
        index: 0,
    }
}

/// Shifts of the fixups targeting the register loaded by `ldst`. Address
/// fixups always target the value word right after its load-state word.
fn fixup_shifts_for(cbuf: &CommandBuffer, ldst: u32) -> Vec<i32> {
    cbuf.fixups()
        .iter()
        .filter(|f| cbuf.read_u32_at(f.field_offset - 4) == ldst)
        .map(|f| f.byte_shift)
        .collect()
}

fn chroma_fixup_shifts(cbuf: &CommandBuffer) -> Vec<i32> {
    let mut shifts = fixup_shifts_for(cbuf, regs::src_ldst(0, regs::SRC_UPLANE_ADDRESS));
    shifts.extend(fixup_shifts_for(cbuf, regs::src_ldst(0, regs::SRC_VPLANE_ADDRESS)));
    shifts
}

#[test]
fn upright_chroma_plane_follows_the_luma_rows() {
    let mut services = SoftServices::new(GRANULARITY);
    let mut batch = Batch::new(dest_state(1, 0, Rotation::Deg0));
    let mut cbuf = CommandBuffer::new(4096);

    do_blit(&mut batch, &mut cbuf, &mut services, &nv12_surface(0, Rotation::Deg0)).unwrap();

    // stride * height bytes of luma before the chroma plane, on both the
    // U and V address fields.
    assert_eq!(chroma_fixup_shifts(&cbuf), vec![1024 * 600, 1024 * 600]);
    assert_eq!(
        count_words(cbuf.as_bytes(), regs::src_ldst(0, regs::SRC_UPLANE_ADDRESS)),
        1
    );
    assert_eq!(
        count_words(cbuf.as_bytes(), regs::src_ldst(0, regs::SRC_VPLANE_ADDRESS)),
        1
    );
}

#[test]
fn rotated_chroma_plane_uses_the_padded_luma_extent() {
    let mut services = SoftServices::new(GRANULARITY);
    let mut batch = Batch::new(dest_state(1, 0, Rotation::Deg0));
    let mut cbuf = CommandBuffer::new(4096);

    do_blit(&mut batch, &mut cbuf, &mut services, &nv12_surface(0, Rotation::Deg90)).unwrap();

    // Rotated access pads the luma plane to stride * width.
    assert_eq!(chroma_fixup_shifts(&cbuf), vec![1024 * 800, 1024 * 800]);

    // Deg90 source against the upright destination is a trailing-270 pair:
    // the pre-recompute 4px source correction lands on the destination
    // address as a 4-row shift.
    assert_eq!(
        fixup_shifts_for(&cbuf, regs::load_state(regs::DST_ADDRESS)),
        vec![4 * 512]
    );
}

#[test]
fn nv12_source_closes_as_a_plain_bitblt() {
    let mut services = SoftServices::new(GRANULARITY);
    let mut batch = Batch::new(dest_state(1, 0, Rotation::Deg0));
    let mut cbuf = CommandBuffer::new(4096);

    do_blit(&mut batch, &mut cbuf, &mut services, &nv12_surface(0, Rotation::Deg0)).unwrap();
    assert!(!batch.open_blit().unwrap().multi_src);
    batch.finish(&mut cbuf).unwrap();

    let dst_fmt = PixelFormat::A8R8G8B8;
    let bitblt = regs::surf_config(
        dst_fmt.code,
        dst_fmt.swizzle,
        regs::DEST_CONFIG_COMMAND_BIT_BLT,
    );
    assert_eq!(count_words(cbuf.as_bytes(), bitblt), 1);
}

#[test]
fn misaligned_luma_base_shifts_the_chroma_plane_too() {
    let mut services = SoftServices::new(GRANULARITY);
    let mut batch = Batch::new(dest_state(1, 0, Rotation::Deg0));
    let mut cbuf = CommandBuffer::new(4096);

    // 12 bytes into a granule at 8bpp: 4px correction, 4 byte shift.
    do_blit(&mut batch, &mut cbuf, &mut services, &nv12_surface(12, Rotation::Deg0)).unwrap();

    let luma_shift = 4;
    let expected_uv = luma_shift + 1024 * 600;
    assert_eq!(
        fixup_shifts_for(&cbuf, regs::src_ldst(0, regs::SRC_ADDRESS)),
        vec![luma_shift]
    );
    assert_eq!(chroma_fixup_shifts(&cbuf), vec![expected_uv, expected_uv]);
}
