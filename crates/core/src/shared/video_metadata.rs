#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
}

impl VideoMetadata {
    /// Nominal length in seconds, or 0 when the frame rate is unknown.
    pub fn duration_secs(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Frame index nearest to `seconds`, saturating at the frame count.
    pub fn frame_at_secs(&self, seconds: f64) -> usize {
        let index = (seconds * self.fps).round().max(0.0) as usize;
        index.min(self.total_frames)
    }
}
