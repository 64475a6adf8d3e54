use crate::shared::crop_band::CropBand;
use crate::shared::frame::Frame;

/// Domain interface for guessing which rows of a frame hold the notation.
///
/// `None` means no usable band was found and the frames stay uncropped.
pub trait CropBoundEstimator: Send + Sync {
    fn estimate(&self, frame: &Frame) -> Option<CropBand>;
}
