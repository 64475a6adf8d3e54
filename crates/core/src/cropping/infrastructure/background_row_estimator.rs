use ndarray::s;

use crate::cropping::domain::crop_estimator::CropBoundEstimator;
use crate::shared::constants::{BACKGROUND_EDGE_MARGIN, BACKGROUND_RGB};
use crate::shared::crop_band::CropBand;
use crate::shared::frame::Frame;

/// Finds the band between the first blank row from the top and the first
/// blank row from the bottom.
///
/// A row is blank when every pixel between the edge margins is exactly the
/// background colour. The scans stop at the first hit, so a frame whose top
/// row is already blank yields `top = 0`.
pub struct BackgroundRowEstimator {
    edge_margin: u32,
    background: [u8; 3],
}

impl BackgroundRowEstimator {
    pub fn new() -> Self {
        Self {
            edge_margin: BACKGROUND_EDGE_MARGIN,
            background: BACKGROUND_RGB,
        }
    }

    pub fn with_edge_margin(mut self, edge_margin: u32) -> Self {
        self.edge_margin = edge_margin;
        self
    }

    fn is_background_row(&self, frame: &Frame, y: u32) -> bool {
        let width = frame.width() as usize;
        let start = (self.edge_margin as usize).min(width);
        let end = width.saturating_sub(self.edge_margin as usize).max(start);
        let channels = (frame.channels() as usize).min(3);

        frame
            .as_ndarray()
            .slice(s![y as usize, start..end, ..channels])
            .outer_iter()
            .all(|pixel| pixel.iter().eq(self.background[..channels].iter()))
    }
}

impl Default for BackgroundRowEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl CropBoundEstimator for BackgroundRowEstimator {
    fn estimate(&self, frame: &Frame) -> Option<CropBand> {
        let height = frame.height();
        let top = (0..height).find(|&y| self.is_background_row(frame, y))?;
        let from_bottom = (0..height)
            .rev()
            .position(|y| self.is_background_row(frame, y))?;
        let bottom = height - from_bottom as u32;

        match CropBand::new(top, bottom) {
            Ok(band) => Some(band),
            Err(_) => {
                log::debug!("Estimated crop band {top}-{bottom} is empty, leaving frames uncropped");
                None
            }
        }
    }
}
