use std::fmt;
use std::str::FromStr;

use super::error::ValidationError;

/// Vertical row range `[top, bottom)` kept when cropping a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropBand {
    top: u32,
    bottom: u32,
}

impl CropBand {
    pub fn new(top: u32, bottom: u32) -> Result<Self, ValidationError> {
        if bottom <= top {
            return Err(ValidationError::InvalidCropBand { top, bottom });
        }
        Ok(Self { top, bottom })
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn bottom(&self) -> u32 {
        self.bottom
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Fits the band to an image of the given height.
    ///
    /// `bottom` is capped at `height` and `top` at the last row. Fails when
    /// nothing would be left of the image.
    pub fn clamp_to(&self, height: u32) -> Result<Self, ValidationError> {
        let degenerate = ValidationError::DegenerateCropBand {
            top: self.top,
            bottom: self.bottom,
            height,
        };
        if height == 0 {
            return Err(degenerate);
        }
        let bottom = self.bottom.min(height);
        let top = self.top.min(height - 1);
        if bottom <= top {
            return Err(degenerate);
        }
        Ok(Self { top, bottom })
    }

    /// True when the band keeps every row of an image of this height.
    pub fn is_full_height(&self, height: u32) -> bool {
        self.top == 0 && self.bottom >= height
    }
}

impl fmt::Display for CropBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.top, self.bottom)
    }
}

impl FromStr for CropBand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || ValidationError::CropBandSyntax(s.to_string());
        let (top, bottom) = s.split_once('-').ok_or_else(syntax)?;
        let top = top.trim().parse::<u32>().map_err(|_| syntax())?;
        let bottom = bottom.trim().parse::<u32>().map_err(|_| syntax())?;
        CropBand::new(top, bottom)
    }
}
