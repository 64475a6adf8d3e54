use std::path::PathBuf;

use crate::shared::error::SendError;
use crate::shared::frame::Frame;

/// Per-run working set of sampled frames, addressed by frame index.
///
/// Stages reload frames from the store instead of holding the whole
/// sequence in memory. Methods take `&self` so per-frame work can run
/// on a thread pool; each call touches only the entry it names.
pub trait FrameStore: Send + Sync {
    /// Persists a frame under its index, replacing any previous entry.
    fn save(&self, frame: &Frame) -> Result<PathBuf, SendError>;

    fn load(&self, index: usize) -> Result<Frame, SendError>;

    /// Stored frame indices in ascending (capture) order.
    fn indices(&self) -> Result<Vec<usize>, SendError>;

    fn remove(&self, index: usize) -> Result<(), SendError>;
}
