//! Blit path: batching policy, source record emission, and batch close.

use core::mem::{offset_of, size_of};

use gc2d_regs as regs;
use tracing::debug;

use crate::align::{resolve_source, SourceSetup};
use crate::batch::{Batch, BatchFlags, BlitState, OpenOp};
use crate::cmdbuf::CommandBuffer;
use crate::error::Result;
use crate::services::{BltServices, DeviceHandle};
use crate::surface::{Rotation, SurfaceInfo};

/// Append one source to the batch, reusing the in-flight multi-source blit
/// when compatible and flushing/reopening it otherwise.
///
/// On error the batch must be discarded: records already appended are not
/// rolled back.
pub fn do_blit(
    batch: &mut Batch,
    cbuf: &mut CommandBuffer,
    services: &mut impl BltServices,
    src: &SurfaceInfo,
) -> Result<()> {
    let setup = resolve_source(src, batch.dest(), services);

    // A misaligned source may have changed the destination program.
    batch.note_dest_setup(&setup);

    if batch.must_flush(&setup) {
        if batch.open_blit().is_some() {
            batch.stats.flushes += 1;
            debug!(flags = ?batch.flags, "flushing incompatible batch");
        }
        batch.finish(cbuf)?;

        let dst_rect = batch
            .dest
            .adjusted
            .offset_back(setup.dst_offset_x, setup.dst_offset_y);
        batch.op = OpenOp::Blit(BlitState {
            src_count: 0,
            multi_src: setup.multi_src,
            block_walk: false,
            rop: src.rop,
            dst_rect,
        });

        let dst_handle = services.map(&batch.dest.info.buf)?;
        set_dst(batch, cbuf, dst_handle)?;

        batch
            .flags
            .remove(BatchFlags::DST | BatchFlags::CLIPRECT | BatchFlags::DESTRECT);
    }

    let src_handle = services.map(&src.buf)?;
    emit_source(batch, cbuf, src_handle, src, &setup)?;

    batch.stats.sources += 1;
    Ok(())
}

/// Program the destination surface for a freshly opened batch.
fn set_dst(batch: &Batch, cbuf: &mut CommandBuffer, handle: DeviceHandle) -> Result<()> {
    let dstinfo = &batch.dest.info;
    let base = cbuf.claim(size_of::<regs::DstRecord>())?;

    cbuf.write_u32_at(
        base + offset_of!(regs::DstRecord, address_ldst),
        regs::load_state(regs::DST_ADDRESS),
    );
    cbuf.write_u32_at(base + offset_of!(regs::DstRecord, address), handle.0);
    cbuf.add_fixup(
        base + offset_of!(regs::DstRecord, address),
        batch.dst_byte_shift,
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::DstRecord, stride_ldst),
        regs::load_state(regs::DST_STRIDE),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::DstRecord, stride),
        dstinfo.geom.virt_stride,
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::DstRecord, rotation_ldst),
        regs::load_state(regs::DST_ROTATION),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::DstRecord, rotation),
        regs::rotation_config(batch.dst_phys_width as u16),
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::DstRecord, rotation_height_ldst),
        regs::load_state(regs::DST_ROTATION_HEIGHT),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::DstRecord, rotation_height),
        regs::rotation_height(batch.dst_phys_height as u16),
    );

    Ok(())
}

/// Write the per-source descriptor record (plus the optional blend and NV12
/// chroma records) into the slot selected by the batch's source count.
fn emit_source(
    batch: &mut Batch,
    cbuf: &mut CommandBuffer,
    handle: DeviceHandle,
    src: &SurfaceInfo,
    setup: &SourceSetup,
) -> Result<()> {
    let dstinfo = batch.dest.info;
    let OpenOp::Blit(state) = &mut batch.op else {
        unreachable!("do_blit opens a blit before emitting sources");
    };

    // Orthogonal pairs force block addressing for the whole batch.
    state.block_walk |= setup.orthogonal;

    let slot = state.src_count;
    debug_assert!(slot < crate::batch::MAX_SOURCES);

    let base = cbuf.claim(size_of::<regs::SrcRecord>())?;

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, address_ldst),
        regs::src_ldst(slot, regs::SRC_ADDRESS),
    );
    cbuf.write_u32_at(base + offset_of!(regs::SrcRecord, address), handle.0);
    cbuf.add_fixup(
        base + offset_of!(regs::SrcRecord, address),
        setup.src_byte_shift,
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, stride_ldst),
        regs::src_ldst(slot, regs::SRC_STRIDE),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, stride),
        src.geom.virt_stride,
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, rotation_ldst),
        regs::src_ldst(slot, regs::SRC_ROTATION),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, rotation),
        regs::rotation_config(setup.src_surf_width as u16),
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, config_ldst),
        regs::src_ldst(slot, regs::SRC_CONFIG),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, config),
        regs::surf_config(src.format.code, src.format.swizzle, 0),
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, origin_ldst),
        regs::src_ldst(slot, regs::SRC_ORIGIN),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, origin),
        regs::pack_xy(setup.src_left as u16, setup.src_top as u16),
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, size_ldst),
        regs::src_ldst(slot, regs::SRC_SIZE),
    );
    cbuf.write_u32_at(base + offset_of!(regs::SrcRecord, size), regs::SRC_SIZE_MAX);

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, rotation_height_ldst),
        regs::src_ldst(slot, regs::SRC_ROTATION_HEIGHT),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, rotation_height),
        regs::rotation_height(setup.src_surf_height as u16),
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, rotation_angle_ldst),
        regs::src_ldst(slot, regs::SRC_ROTATION_ANGLE),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, rotation_angle),
        regs::rotation_angle(
            src.angle.hw_code(),
            dstinfo.angle.hw_code(),
            src.mirror.hw_code(),
            regs::MIRROR_NONE,
        ),
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, rop_ldst),
        regs::src_ldst(slot, regs::SRC_ROP),
    );
    cbuf.write_u32_at(base + offset_of!(regs::SrcRecord, rop), regs::rop3(state.rop));

    let src_premul = if src.format.premultiplied {
        regs::PREMULTIPLY_DISABLE
    } else {
        regs::PREMULTIPLY_ENABLE
    };
    let (dst_premul, dst_demul) = if dstinfo.format.premultiplied {
        (regs::PREMULTIPLY_DISABLE, regs::DEMULTIPLY_DISABLE)
    } else {
        (regs::PREMULTIPLY_ENABLE, regs::DEMULTIPLY_ENABLE)
    };
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, mult_ldst),
        regs::src_ldst(slot, regs::SRC_MULT),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, mult),
        regs::color_mult(src_premul, regs::PREMULTIPLY_DISABLE, dst_premul, dst_demul),
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, alpha_control_ldst),
        regs::src_ldst(slot, regs::SRC_ALPHA_CONTROL),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::SrcRecord, alpha_control),
        if src.blend.is_some() {
            regs::ALPHA_CONTROL_ON
        } else {
            regs::ALPHA_CONTROL_OFF
        },
    );

    if let Some(gca) = &src.blend {
        let base = cbuf.claim(size_of::<regs::SrcAlphaRecord>())?;

        cbuf.write_u32_at(
            base + offset_of!(regs::SrcAlphaRecord, alpha_modes_ldst),
            regs::src_ldst(slot, regs::SRC_ALPHA_MODES),
        );
        cbuf.write_u32_at(
            base + offset_of!(regs::SrcAlphaRecord, alpha_modes),
            regs::alpha_modes(
                gca.src_global_alpha_mode,
                gca.dst_global_alpha_mode,
                gca.src_factor_mode,
                gca.src_color_reverse,
                gca.dst_factor_mode,
                gca.dst_color_reverse,
            ),
        );

        cbuf.write_u32_at(
            base + offset_of!(regs::SrcAlphaRecord, src_global_ldst),
            regs::src_ldst(slot, regs::SRC_GLOBAL_SRC_COLOR),
        );
        cbuf.write_u32_at(
            base + offset_of!(regs::SrcAlphaRecord, src_global),
            gca.src_global_color,
        );

        cbuf.write_u32_at(
            base + offset_of!(regs::SrcAlphaRecord, dst_global_ldst),
            regs::src_ldst(slot, regs::SRC_GLOBAL_DST_COLOR),
        );
        cbuf.write_u32_at(
            base + offset_of!(regs::SrcAlphaRecord, dst_global),
            gca.dst_global_color,
        );
    }

    if src.format.is_nv12() {
        // The chroma plane follows the luma plane. Rotated access pads the
        // luma plane out to stride * width instead of stride * height.
        let luma_bytes = match src.angle {
            Rotation::Deg0 | Rotation::Deg180 => src.geom.virt_stride * src.geom.height,
            Rotation::Deg90 | Rotation::Deg270 => src.geom.virt_stride * src.geom.width,
        };
        let uv_shift = setup.src_byte_shift + luma_bytes as i32;

        debug!(uv_shift, "NV12 chroma plane");

        let base = cbuf.claim(size_of::<regs::SrcYuvRecord>())?;

        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, uplane_address_ldst),
            regs::src_ldst(slot, regs::SRC_UPLANE_ADDRESS),
        );
        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, uplane_address),
            handle.0,
        );
        cbuf.add_fixup(
            base + offset_of!(regs::SrcYuvRecord, uplane_address),
            uv_shift,
        );

        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, uplane_stride_ldst),
            regs::src_ldst(slot, regs::SRC_UPLANE_STRIDE),
        );
        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, uplane_stride),
            src.geom.virt_stride,
        );

        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, vplane_address_ldst),
            regs::src_ldst(slot, regs::SRC_VPLANE_ADDRESS),
        );
        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, vplane_address),
            handle.0,
        );
        cbuf.add_fixup(
            base + offset_of!(regs::SrcYuvRecord, vplane_address),
            uv_shift,
        );

        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, vplane_stride_ldst),
            regs::src_ldst(slot, regs::SRC_VPLANE_STRIDE),
        );
        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, vplane_stride),
            src.geom.virt_stride,
        );

        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, pe_control_ldst),
            regs::src_ldst(slot, regs::SRC_PE_CONTROL),
        );
        cbuf.write_u32_at(
            base + offset_of!(regs::SrcYuvRecord, pe_control),
            regs::PE_CONTROL_RESET,
        );
    }

    let OpenOp::Blit(state) = &mut batch.op else {
        unreachable!("open blit checked above");
    };
    state.src_count += 1;
    Ok(())
}

/// Close an accumulated blit: multi-source control, destination
/// configuration, ROP, then the engine start with the final rectangle.
pub(crate) fn emit_blit_end(
    batch: &mut Batch,
    cbuf: &mut CommandBuffer,
    state: &BlitState,
) -> Result<()> {
    let dstinfo = &batch.dest.info;

    debug!(
        src_count = state.src_count,
        multi_src = state.multi_src,
        block_walk = state.block_walk,
        "finalizing blit"
    );

    let base = cbuf.claim(size_of::<regs::BltConfigRecord>())?;

    let (horblock, verblock) = if state.block_walk {
        (regs::HORIZONTAL_BLOCK_PIXEL16, regs::VERTICAL_BLOCK_LINE64)
    } else {
        (regs::HORIZONTAL_BLOCK_PIXEL128, regs::VERTICAL_BLOCK_LINE1)
    };
    cbuf.write_u32_at(
        base + offset_of!(regs::BltConfigRecord, multi_source_ldst),
        regs::load_state(regs::MULTI_SOURCE),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::BltConfigRecord, multi_source),
        regs::multi_source(state.src_count.saturating_sub(1), horblock, verblock),
    );

    let command = if state.multi_src {
        regs::DEST_CONFIG_COMMAND_MULTI_SOURCE_BLT
    } else {
        regs::DEST_CONFIG_COMMAND_BIT_BLT
    };
    cbuf.write_u32_at(
        base + offset_of!(regs::BltConfigRecord, dst_config_ldst),
        regs::load_state(regs::DST_CONFIG),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::BltConfigRecord, dst_config),
        regs::surf_config(dstinfo.format.code, dstinfo.format.swizzle, command),
    );

    cbuf.write_u32_at(
        base + offset_of!(regs::BltConfigRecord, rop_ldst),
        regs::load_state(regs::ROP),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::BltConfigRecord, rop),
        regs::rop3(state.rop),
    );

    let base = cbuf.claim(size_of::<regs::StartDeRecord>())?;
    cbuf.write_u32_at(base + offset_of!(regs::StartDeRecord, cmd), regs::START_DE);
    cbuf.write_u32_at(
        base + offset_of!(regs::StartDeRecord, rect_lt),
        regs::pack_xy(state.dst_rect.left as u16, state.dst_rect.top as u16),
    );
    cbuf.write_u32_at(
        base + offset_of!(regs::StartDeRecord, rect_rb),
        regs::pack_xy(state.dst_rect.right as u16, state.dst_rect.bottom as u16),
    );

    batch.stats.batches += 1;
    Ok(())
}
