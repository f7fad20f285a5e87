//! GC320 2D draw engine (DE) register layouts.
//!
//! Command records are fixed-shape sequences of `(LOAD_STATE, value)` word
//! pairs that must match the engine's documented register map bit-for-bit.
//! The structs here are `repr(C, packed)` so the command core can write
//! individual fields with `offset_of!` without any per-record serializer.

/* ------------------------------ FE commands ------------------------------ */

/// FE `LOAD_STATE` command word loading a single register at `address`.
///
/// `address` is a byte offset into the DE register file and must be 4-byte
/// aligned.
pub const fn load_state(address: u32) -> u32 {
    (0x1 << 27) | (1 << 16) | (address >> 2)
}

/// FE `START_DE` command word carrying one destination rectangle.
pub const START_DE: u32 = (0x4 << 27) | (1 << 8);

/// Pack an (x, y) coordinate pair into a single register word.
pub const fn pack_xy(x: u16, y: u16) -> u32 {
    (x as u32) | ((y as u32) << 16)
}

/* ----------------------------- Register file ----------------------------- */

pub const DST_ADDRESS: u32 = 0x1228;
pub const DST_STRIDE: u32 = 0x122C;
pub const DST_ROTATION: u32 = 0x1230;
pub const DST_CONFIG: u32 = 0x1234;
pub const ROP: u32 = 0x125C;
pub const MULTI_SOURCE: u32 = 0x12AC;
pub const DST_ROTATION_HEIGHT: u32 = 0x12BC;

/// Base of the multi-source register banks. Each of the four source slots
/// owns a bank of `SRC_BANK_STRIDE` bytes.
pub const SRC_BANK_BASE: u32 = 0x4A00;
pub const SRC_BANK_STRIDE: u32 = 0x80;

pub const SRC_ADDRESS: u32 = 0x00;
pub const SRC_STRIDE: u32 = 0x04;
pub const SRC_ROTATION: u32 = 0x08;
pub const SRC_CONFIG: u32 = 0x0C;
pub const SRC_ORIGIN: u32 = 0x10;
pub const SRC_SIZE: u32 = 0x14;
pub const SRC_ROTATION_HEIGHT: u32 = 0x18;
pub const SRC_ROTATION_ANGLE: u32 = 0x1C;
pub const SRC_ROP: u32 = 0x20;
pub const SRC_MULT: u32 = 0x24;
pub const SRC_ALPHA_CONTROL: u32 = 0x28;
pub const SRC_ALPHA_MODES: u32 = 0x2C;
pub const SRC_GLOBAL_SRC_COLOR: u32 = 0x30;
pub const SRC_GLOBAL_DST_COLOR: u32 = 0x34;
pub const SRC_UPLANE_ADDRESS: u32 = 0x38;
pub const SRC_UPLANE_STRIDE: u32 = 0x3C;
pub const SRC_VPLANE_ADDRESS: u32 = 0x40;
pub const SRC_VPLANE_STRIDE: u32 = 0x44;
pub const SRC_PE_CONTROL: u32 = 0x48;

/// Register address of `reg` within source slot `slot`'s bank.
pub const fn src_reg(slot: u32, reg: u32) -> u32 {
    SRC_BANK_BASE + slot * SRC_BANK_STRIDE + reg
}

/// `LOAD_STATE` word for `reg` within source slot `slot`'s bank.
pub const fn src_ldst(slot: u32, reg: u32) -> u32 {
    load_state(src_reg(slot, reg))
}

/* ----------------------------- Field encodings ---------------------------- */

/// Rotation angle field encodings, indexed by angle / 90.
///
/// Codes 1..=3 select the mirror-only transforms and are not reachable from
/// the blit path.
pub const ROT_ENCODING: [u32; 4] = [0x0, 0x4, 0x5, 0x6];

pub const MIRROR_NONE: u32 = 0;
pub const MIRROR_X: u32 = 1;
pub const MIRROR_Y: u32 = 2;
pub const MIRROR_XY: u32 = 3;

pub const DE_FORMAT_X4R4G4B4: u32 = 0x00;
pub const DE_FORMAT_A4R4G4B4: u32 = 0x01;
pub const DE_FORMAT_X1R5G5B5: u32 = 0x02;
pub const DE_FORMAT_A1R5G5B5: u32 = 0x03;
pub const DE_FORMAT_R5G6B5: u32 = 0x04;
pub const DE_FORMAT_X8R8G8B8: u32 = 0x05;
pub const DE_FORMAT_A8R8G8B8: u32 = 0x06;
pub const DE_FORMAT_YUY2: u32 = 0x07;
pub const DE_FORMAT_UYVY: u32 = 0x08;
pub const DE_FORMAT_NV12: u32 = 0x11;

pub const DE_SWIZZLE_ARGB: u32 = 0;
pub const DE_SWIZZLE_RGBA: u32 = 1;
pub const DE_SWIZZLE_ABGR: u32 = 2;
pub const DE_SWIZZLE_BGRA: u32 = 3;

pub const DEST_CONFIG_COMMAND_BIT_BLT: u32 = 0x2;
pub const DEST_CONFIG_COMMAND_MULTI_SOURCE_BLT: u32 = 0x8;

pub const HORIZONTAL_BLOCK_PIXEL16: u32 = 2;
pub const HORIZONTAL_BLOCK_PIXEL128: u32 = 5;
pub const VERTICAL_BLOCK_LINE1: u32 = 0;
pub const VERTICAL_BLOCK_LINE64: u32 = 6;

pub const ROP_TYPE_ROP3: u32 = 2;

pub const ALPHA_CONTROL_OFF: u32 = 0;
pub const ALPHA_CONTROL_ON: u32 = 1;

pub const PREMULTIPLY_DISABLE: u32 = 0;
pub const PREMULTIPLY_ENABLE: u32 = 1;
pub const DEMULTIPLY_DISABLE: u32 = 0;
pub const DEMULTIPLY_ENABLE: u32 = 1;

/// `PE_CONTROL` reset value restored after a YUV source finishes.
pub const PE_CONTROL_RESET: u32 = 0;

/// Source-size sentinel: size is ignored for bit-blt, the engine wants the
/// maximum encodable rectangle here.
pub const SRC_SIZE_MAX: u32 = 0xFFFF_FFFF;

/// `SRC_ROTATION` / `DST_ROTATION`: surface width with rotation addressing
/// enabled.
pub const fn rotation_config(width: u16) -> u32 {
    (width as u32) | (1 << 16)
}

/// `SRC_ROTATION_HEIGHT` / `DST_ROTATION_HEIGHT`.
pub const fn rotation_height(height: u16) -> u32 {
    height as u32
}

/// `SRC_CONFIG` / `DST_CONFIG` format and swizzle; `command` is only decoded
/// from the destination register.
pub const fn surf_config(format: u32, swizzle: u32, command: u32) -> u32 {
    format | (swizzle << 16) | (command << 8)
}

/// `SRC_ROTATION_ANGLE`: rotation and mirror selects for both ends of the
/// transfer.
pub const fn rotation_angle(src: u32, dst: u32, src_mirror: u32, dst_mirror: u32) -> u32 {
    src | (dst << 3) | (src_mirror << 12) | (dst_mirror << 14)
}

/// `ROP` / `SRC_ROP`: a ROP3 code in the foreground field.
pub const fn rop3(fg: u8) -> u32 {
    (ROP_TYPE_ROP3 << 20) | (fg as u32)
}

/// `MULTI_SOURCE` control: number of sources minus one plus the block walk
/// geometry.
pub const fn multi_source(srccount_minus1: u32, horblock: u32, verblock: u32) -> u32 {
    srccount_minus1 | (horblock << 8) | (verblock << 16)
}

/// `SRC_MULT` color multiply modes.
pub const fn color_mult(
    src_premul: u32,
    src_global_premul: u32,
    dst_premul: u32,
    dst_demul: u32,
) -> u32 {
    src_premul | (src_global_premul << 8) | (dst_premul << 4) | (dst_demul << 20)
}

/// `SRC_ALPHA_MODES` blend factor and global alpha selects.
pub const fn alpha_modes(
    src_global_alpha_mode: u32,
    dst_global_alpha_mode: u32,
    src_blend: u32,
    src_color_reverse: bool,
    dst_blend: u32,
    dst_color_reverse: bool,
) -> u32 {
    src_global_alpha_mode
        | (dst_global_alpha_mode << 2)
        | (src_blend << 8)
        | ((src_color_reverse as u32) << 13)
        | (dst_blend << 16)
        | ((dst_color_reverse as u32) << 21)
}

/* ---------------------------- Command records ----------------------------- */

/// Per-source descriptor record, one per appended source.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct SrcRecord {
    pub address_ldst: u32,
    pub address: u32,
    pub stride_ldst: u32,
    pub stride: u32,
    pub rotation_ldst: u32,
    pub rotation: u32,
    pub config_ldst: u32,
    pub config: u32,
    pub origin_ldst: u32,
    pub origin: u32,
    pub size_ldst: u32,
    pub size: u32,
    pub rotation_height_ldst: u32,
    pub rotation_height: u32,
    pub rotation_angle_ldst: u32,
    pub rotation_angle: u32,
    pub rop_ldst: u32,
    pub rop: u32,
    pub mult_ldst: u32,
    pub mult: u32,
    pub alpha_control_ldst: u32,
    pub alpha_control: u32,
}

/// Blend configuration record, emitted only when a source carries a blend
/// config.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct SrcAlphaRecord {
    pub alpha_modes_ldst: u32,
    pub alpha_modes: u32,
    pub src_global_ldst: u32,
    pub src_global: u32,
    pub dst_global_ldst: u32,
    pub dst_global: u32,
}

/// NV12 chroma-plane record. The U and V plane registers both point at the
/// interleaved chroma plane.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct SrcYuvRecord {
    pub uplane_address_ldst: u32,
    pub uplane_address: u32,
    pub uplane_stride_ldst: u32,
    pub uplane_stride: u32,
    pub vplane_address_ldst: u32,
    pub vplane_address: u32,
    pub vplane_stride_ldst: u32,
    pub vplane_stride: u32,
    pub pe_control_ldst: u32,
    pub pe_control: u32,
}

/// Destination surface record emitted when a batch binds its destination.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct DstRecord {
    pub address_ldst: u32,
    pub address: u32,
    pub stride_ldst: u32,
    pub stride: u32,
    pub rotation_ldst: u32,
    pub rotation: u32,
    pub rotation_height_ldst: u32,
    pub rotation_height: u32,
}

/// Batch-close configuration record: multi-source control, destination
/// format/command, ROP.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct BltConfigRecord {
    pub multi_source_ldst: u32,
    pub multi_source: u32,
    pub dst_config_ldst: u32,
    pub dst_config: u32,
    pub rop_ldst: u32,
    pub rop: u32,
}

/// Engine-start record carrying the final destination rectangle.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct StartDeRecord {
    pub cmd: u32,
    pub _reserved: u32,
    pub rect_lt: u32,
    pub rect_rb: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_state_encodes_word_address() {
        assert_eq!(load_state(DST_ADDRESS), (0x1 << 27) | (1 << 16) | (0x1228 >> 2));
    }

    #[test]
    fn src_banks_do_not_overlap() {
        for slot in 0..3u32 {
            assert!(src_reg(slot, SRC_PE_CONTROL) < src_reg(slot + 1, SRC_ADDRESS));
        }
    }

    #[test]
    fn slot_ldst_words_are_distinct() {
        let words: Vec<u32> = (0..4).map(|s| src_ldst(s, SRC_ADDRESS)).collect();
        for (i, a) in words.iter().enumerate() {
            for b in &words[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn multi_source_packs_fields() {
        let v = multi_source(3, HORIZONTAL_BLOCK_PIXEL16, VERTICAL_BLOCK_LINE64);
        assert_eq!(v & 0x7, 3);
        assert_eq!((v >> 8) & 0x7, HORIZONTAL_BLOCK_PIXEL16);
        assert_eq!((v >> 16) & 0x7, VERTICAL_BLOCK_LINE64);
    }

    #[test]
    fn rotation_angle_packs_fields() {
        let v = rotation_angle(ROT_ENCODING[1], ROT_ENCODING[3], MIRROR_X, MIRROR_NONE);
        assert_eq!(v & 0x7, ROT_ENCODING[1]);
        assert_eq!((v >> 3) & 0x7, ROT_ENCODING[3]);
        assert_eq!((v >> 12) & 0x3, MIRROR_X);
        assert_eq!((v >> 14) & 0x3, MIRROR_NONE);
    }

    #[test]
    fn rop3_sets_type_and_foreground() {
        assert_eq!(rop3(0xCC), (ROP_TYPE_ROP3 << 20) | 0xCC);
    }

    #[test]
    fn records_are_word_multiples() {
        use core::mem::size_of;
        assert_eq!(size_of::<SrcRecord>() % 4, 0);
        assert_eq!(size_of::<SrcAlphaRecord>() % 4, 0);
        assert_eq!(size_of::<SrcYuvRecord>() % 4, 0);
        assert_eq!(size_of::<DstRecord>() % 4, 0);
        assert_eq!(size_of::<BltConfigRecord>() % 4, 0);
        assert_eq!(size_of::<StartDeRecord>() % 4, 0);
    }
}
