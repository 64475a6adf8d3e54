use std::path::PathBuf;

use thiserror::Error;

/// Rejected user input. Raised before a stage writes anything.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("sampling interval must be positive, got {0} ms")]
    ZeroInterval(u64),
    #[error("interval of {interval_ms} ms is shorter than one frame at {fps:.2} fps")]
    IntervalBelowFrame { interval_ms: u64, fps: f64 },
    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),
    #[error("invalid crop band {top}-{bottom}: bottom must be greater than top")]
    InvalidCropBand { top: u32, bottom: u32 },
    #[error("crop band {top}-{bottom} is empty for images {height} px tall")]
    DegenerateCropBand { top: u32, bottom: u32, height: u32 },
    #[error("could not parse crop band '{0}', expected TOP-BOTTOM")]
    CropBandSyntax(String),
    #[error("invalid timestamp '{0}', expected M:SS")]
    TimestampSyntax(String),
    #[error("could not parse trim range '{0}', expected M:SS-M:SS")]
    TrimSyntax(String),
    #[error("trim end {end_secs}s must be after start {start_secs}s")]
    InvalidTrimRange { start_secs: u64, end_secs: u64 },
}

/// Failure of a whole grab run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("video file not found: {}", .0.display())]
    MissingVideo(PathBuf),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no frames were sampled from {}", .0.display())]
    NoFrames(PathBuf),
    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

impl PipelineError {
    pub fn stage(stage: &'static str, source: Box<dyn std::error::Error>) -> Self {
        Self::Stage { stage, source }
    }
}

/// Boxed error that can cross thread boundaries (worker pools, channels).
pub type SendError = Box<dyn std::error::Error + Send + Sync>;
