use std::ops::Range;

use crate::shared::error::ValidationError;
use crate::shared::trim_range::TrimRange;
use crate::shared::video_metadata::VideoMetadata;

/// Number of frames between samples: `round(fps * interval_ms / 1000)`.
///
/// Rejects intervals that would round to less than one frame.
pub fn frame_stride(fps: f64, interval_ms: u64) -> Result<usize, ValidationError> {
    if interval_ms == 0 {
        return Err(ValidationError::ZeroInterval(interval_ms));
    }
    if !(fps.is_finite() && fps > 0.0) {
        return Err(ValidationError::InvalidFrameRate(fps));
    }
    let stride = (fps * interval_ms as f64 / 1000.0).round();
    if stride < 1.0 {
        return Err(ValidationError::IntervalBelowFrame { interval_ms, fps });
    }
    Ok(stride as usize)
}

/// Which frame indices to sample: every `stride`-th index of `range`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplingPlan {
    stride: usize,
    range: Range<usize>,
}

impl SamplingPlan {
    pub fn new(stride: usize, range: Range<usize>) -> Self {
        debug_assert!(stride >= 1, "stride must be at least one frame");
        Self {
            stride: stride.max(1),
            range,
        }
    }

    /// Plans sampling over a whole video, or only the trimmed window.
    pub fn for_video(
        metadata: &VideoMetadata,
        interval_ms: u64,
        trim: Option<&TrimRange>,
    ) -> Result<Self, ValidationError> {
        let stride = frame_stride(metadata.fps, interval_ms)?;
        let range = match trim {
            Some(trim) => {
                if trim.start_secs() as f64 >= metadata.duration_secs() {
                    log::warn!(
                        "Trim window starts at {}s, after the end of the {:.1}s video",
                        trim.start_secs(),
                        metadata.duration_secs()
                    );
                }
                trim.frame_range(metadata)
            }
            None => 0..metadata.total_frames,
        };
        Ok(Self::new(stride, range))
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// `ceil(frames / stride)`: how many samples a full decode yields.
    pub fn expected_count(&self) -> usize {
        self.range.len().div_ceil(self.stride)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> {
        self.range.clone().step_by(self.stride)
    }
}
