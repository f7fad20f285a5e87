//! Batch lifecycle: destination binding state, dirty tracking, and the
//! tagged open-operation variant that selects how a batch is closed.

use bitflags::bitflags;

use crate::align::SourceSetup;
use crate::cmdbuf::CommandBuffer;
use crate::error::Result;
use crate::surface::{Rect, SurfaceInfo};

bitflags! {
    /// Dirty flags forcing the next source to reopen the batch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BatchFlags: u32 {
        const DST = 1 << 0;
        const CLIPRECT = 1 << 1;
        const DESTRECT = 1 << 2;
    }
}

/// Destination state installed by the caller's clipping/rotation
/// preprocessing before sources are appended.
#[derive(Clone, Copy, Debug)]
pub struct DestState {
    pub info: SurfaceInfo,
    /// Destination rectangle after clipping, in device coordinates.
    pub adjusted: Rect,
    /// Translation applied by clipping, added to every source origin.
    pub clip_delta: Rect,
    /// Rotated destination dimensions used as the rotation pivot.
    pub width: i32,
    pub height: i32,
}

/// State of the blit operation currently open in a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlitState {
    /// Sources appended so far; the hardware takes at most four.
    pub src_count: u32,
    pub multi_src: bool,
    /// Set when any appended source is orthogonal to the destination;
    /// selects the block walk geometry at finalize time.
    pub block_walk: bool,
    pub rop: u8,
    /// Final destination rectangle handed to `START_DE`.
    pub dst_rect: Rect,
}

pub const MAX_SOURCES: u32 = 4;

/// Which kind of operation the batch currently has open. Closing behavior is
/// dispatched on this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenOp {
    /// Nothing open; finishing is a no-op.
    None,
    Blit(BlitState),
}

/// Counters for diagnostics; mirrors what the engine was actually asked to
/// do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlitStats {
    pub sources: u64,
    pub batches: u64,
    pub flushes: u64,
}

/// A unit of hardware submission under construction.
///
/// Exclusively owned by one call sequence; all blit calls that share a batch
/// must be serialized by the caller.
#[derive(Debug)]
pub struct Batch {
    pub(crate) dest: DestState,
    pub(crate) flags: BatchFlags,
    pub(crate) op: OpenOp,
    pub(crate) stats: BlitStats,

    // Cached resolver output for the bound destination; any change here
    // invalidates an otherwise-compatible in-flight batch.
    pub(crate) dst_byte_shift: i32,
    pub(crate) dst_phys_width: u32,
    pub(crate) dst_phys_height: u32,
    pub(crate) dst_offset_x: i32,
    pub(crate) dst_offset_y: i32,
}

impl Batch {
    pub fn new(dest: DestState) -> Self {
        Self {
            dest,
            flags: BatchFlags::all(),
            op: OpenOp::None,
            stats: BlitStats::default(),
            dst_byte_shift: 0,
            dst_phys_width: 0,
            dst_phys_height: 0,
            dst_offset_x: 0,
            dst_offset_y: 0,
        }
    }

    /// Install new destination preprocessing output, marking whatever
    /// changed so the next source reopens the batch.
    pub fn set_destination(&mut self, dest: DestState) {
        if self.dest.info.buf != dest.info.buf
            || self.dest.info.geom != dest.info.geom
            || self.dest.info.format != dest.info.format
            || self.dest.info.angle != dest.info.angle
        {
            self.flags |= BatchFlags::DST;
        }
        if self.dest.adjusted != dest.adjusted
            || self.dest.width != dest.width
            || self.dest.height != dest.height
        {
            self.flags |= BatchFlags::DESTRECT;
        }
        if self.dest.clip_delta != dest.clip_delta {
            self.flags |= BatchFlags::CLIPRECT;
        }
        self.dest = dest;
    }

    pub fn dest(&self) -> &DestState {
        &self.dest
    }

    /// The blit state currently open, if any.
    pub fn open_blit(&self) -> Option<&BlitState> {
        match &self.op {
            OpenOp::Blit(state) => Some(state),
            OpenOp::None => None,
        }
    }

    pub fn stats(&self) -> BlitStats {
        self.stats
    }

    /// Fold the resolver's destination output into the cache; a mismatch
    /// means the hardware needs a new destination program.
    pub(crate) fn note_dest_setup(&mut self, setup: &SourceSetup) {
        if self.dst_byte_shift != setup.dst_byte_shift
            || self.dst_phys_width != setup.dst_phys_width
            || self.dst_phys_height != setup.dst_phys_height
            || self.dst_offset_x != setup.dst_offset_x
            || self.dst_offset_y != setup.dst_offset_y
        {
            self.dst_byte_shift = setup.dst_byte_shift;
            self.dst_phys_width = setup.dst_phys_width;
            self.dst_phys_height = setup.dst_phys_height;
            self.dst_offset_x = setup.dst_offset_x;
            self.dst_offset_y = setup.dst_offset_y;

            self.flags |= BatchFlags::DST;
        }
    }

    /// Whether the in-flight batch can absorb a source resolved to `setup`.
    pub(crate) fn must_flush(&self, setup: &SourceSetup) -> bool {
        let blit = match &self.op {
            OpenOp::Blit(state) => state,
            OpenOp::None => return true,
        };
        blit.src_count == MAX_SOURCES
            || !blit.multi_src
            || !setup.multi_src
            || self
                .flags
                .intersects(BatchFlags::DST | BatchFlags::CLIPRECT | BatchFlags::DESTRECT)
    }

    /// Close whatever operation is currently open. Invoked on flush and when
    /// the caller signals that no more sources are coming.
    pub fn finish(&mut self, cbuf: &mut CommandBuffer) -> Result<()> {
        match std::mem::replace(&mut self.op, OpenOp::None) {
            OpenOp::None => Ok(()),
            OpenOp::Blit(state) => crate::blit::emit_blit_end(self, cbuf, &state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{BufferDesc, Geometry, Mirror, PixelFormat, Rotation};

    fn dest() -> DestState {
        DestState {
            info: SurfaceInfo {
                geom: Geometry {
                    width: 64,
                    height: 64,
                    virt_stride: 256,
                },
                format: PixelFormat::A8R8G8B8,
                rect: Rect::new(0, 0, 64, 64),
                angle: Rotation::Deg0,
                mirror: Mirror::None,
                pix_align: 0,
                byte_align: 0,
                phys_width: 64,
                phys_height: 64,
                blend: None,
                rop: 0xCC,
                buf: BufferDesc {
                    id: 1,
                    base_offset: 0,
                    size: 0x10000,
                },
                index: 0,
            },
            adjusted: Rect::new(0, 0, 64, 64),
            clip_delta: Rect::default(),
            width: 64,
            height: 64,
        }
    }

    #[test]
    fn fresh_batch_is_fully_dirty_and_idle() {
        let batch = Batch::new(dest());
        assert_eq!(batch.flags, BatchFlags::all());
        assert!(batch.open_blit().is_none());
    }

    #[test]
    fn finishing_an_idle_batch_emits_nothing() {
        let mut batch = Batch::new(dest());
        let mut cbuf = CommandBuffer::new(256);
        batch.finish(&mut cbuf).unwrap();
        assert!(cbuf.is_empty());
        assert_eq!(batch.stats().batches, 0);
    }

    #[test]
    fn changing_the_destination_rect_marks_destrect() {
        let mut batch = Batch::new(dest());
        batch.flags = BatchFlags::empty();

        let mut d = dest();
        d.adjusted = Rect::new(4, 0, 64, 64);
        batch.set_destination(d);
        assert_eq!(batch.flags, BatchFlags::DESTRECT);
    }

    #[test]
    fn changing_the_clip_delta_marks_cliprect() {
        let mut batch = Batch::new(dest());
        batch.flags = BatchFlags::empty();

        let mut d = dest();
        d.clip_delta = Rect::new(-2, 0, -2, 0);
        batch.set_destination(d);
        assert_eq!(batch.flags, BatchFlags::CLIPRECT);
    }

    #[test]
    fn changing_the_destination_buffer_marks_dst() {
        let mut batch = Batch::new(dest());
        batch.flags = BatchFlags::empty();

        let mut d = dest();
        d.info.buf.id = 2;
        batch.set_destination(d);
        assert_eq!(batch.flags, BatchFlags::DST);
    }
}
