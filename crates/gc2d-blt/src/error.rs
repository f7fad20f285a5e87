use thiserror::Error;

pub type Result<T> = std::result::Result<T, BltError>;

/// Failures surfaced by the blit command core.
///
/// Any error aborts the in-progress call. Command records appended before the
/// failure are not rolled back; callers must discard the whole batch and must
/// not submit it to the device.
#[derive(Debug, Error)]
pub enum BltError {
    #[error("command buffer exhausted: need {need} bytes, {remaining} remaining")]
    OutOfSpace { need: usize, remaining: usize },

    #[error("failed to map buffer {id}: {reason}")]
    Map { id: u64, reason: String },
}
