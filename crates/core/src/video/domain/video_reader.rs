use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Random-access frame source for a decoded video.
///
/// Implementations handle I/O details (codec, container format, seeking)
/// while the pipeline works with the abstract `Frame` and `VideoMetadata`
/// types.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Decodes the frame at exactly `index`.
    ///
    /// Returns `Ok(None)` when the decoder has no frame there, which is
    /// normal near the end of a trimmed video.
    fn frame_at(&mut self, index: usize) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
