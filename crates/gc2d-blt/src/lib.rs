//! Command-generation core for the GC320 2D blit engine.
//!
//! Translates rotation- and format-agnostic blit requests into hardware
//! command records, opportunistically packing up to four compatible sources
//! into one multi-source engine invocation. Command-buffer memory policy,
//! relocation resolution, and destination clipping/rotation preprocessing
//! are collaborators, not part of this crate.

pub mod align;
pub mod batch;
pub mod blit;
pub mod cmdbuf;
pub mod error;
pub mod services;
pub mod surface;

pub use align::{resolve_source, SourceSetup};
pub use batch::{Batch, BatchFlags, BlitState, BlitStats, DestState, OpenOp, MAX_SOURCES};
pub use blit::do_blit;
pub use cmdbuf::{CommandBuffer, Fixup};
pub use error::{BltError, Result};
pub use services::{BltServices, DeviceHandle, SoftServices};
pub use surface::{
    BlendConfig, BufferDesc, Geometry, Mirror, PixelFormat, Rect, Rotation, SurfaceInfo,
};
