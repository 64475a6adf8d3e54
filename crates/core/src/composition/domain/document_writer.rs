use std::path::Path;

use crate::shared::frame::Frame;

/// Writes composed pages, in order, to a single multi-page document.
pub trait DocumentWriter: Send {
    fn write(&self, path: &Path, pages: &[Frame]) -> Result<(), Box<dyn std::error::Error>>;
}
