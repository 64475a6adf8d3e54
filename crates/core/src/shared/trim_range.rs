use std::ops::Range;
use std::str::FromStr;

use super::error::ValidationError;
use super::video_metadata::VideoMetadata;

/// A `M:SS-M:SS` window of the source video to sample from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrimRange {
    start_secs: u64,
    end_secs: u64,
}

impl TrimRange {
    pub fn new(start_secs: u64, end_secs: u64) -> Result<Self, ValidationError> {
        if end_secs <= start_secs {
            return Err(ValidationError::InvalidTrimRange {
                start_secs,
                end_secs,
            });
        }
        Ok(Self {
            start_secs,
            end_secs,
        })
    }

    pub fn start_secs(&self) -> u64 {
        self.start_secs
    }

    pub fn end_secs(&self) -> u64 {
        self.end_secs
    }

    /// Frame indices covered by the window, clipped to the video length.
    pub fn frame_range(&self, metadata: &VideoMetadata) -> Range<usize> {
        let start = metadata.frame_at_secs(self.start_secs as f64);
        let end = metadata.frame_at_secs(self.end_secs as f64);
        start..end.max(start)
    }
}

/// Parses `M:SS` (minutes may have any number of digits) into seconds.
pub fn parse_timestamp(s: &str) -> Result<u64, ValidationError> {
    let syntax = || ValidationError::TimestampSyntax(s.to_string());
    let (minutes, seconds) = s.trim().split_once(':').ok_or_else(syntax)?;
    let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(minutes) || !is_digits(seconds) {
        return Err(syntax());
    }
    let minutes: u64 = minutes.parse().map_err(|_| syntax())?;
    let seconds: u64 = seconds.parse().map_err(|_| syntax())?;
    Ok(minutes * 60 + seconds)
}

impl FromStr for TrimRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| ValidationError::TrimSyntax(s.to_string()))?;
        TrimRange::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }
}
