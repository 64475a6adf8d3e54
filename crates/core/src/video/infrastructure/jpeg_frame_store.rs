use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::{FRAME_EXTENSION, JPEG_QUALITY};
use crate::shared::error::SendError;
use crate::shared::frame::Frame;
use crate::video::domain::frame_store::FrameStore;

use super::image_file_writer::save_rgb_image;

/// Keeps the working set as `<root>/<frame_index>.jpg` files.
///
/// Capture order is recovered by parsing the index back out of each file
/// name, so the directory can be reused by a later run.
pub struct JpegFrameStore {
    root: PathBuf,
    quality: u8,
}

impl JpegFrameStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn create(root: &Path) -> Result<Self, SendError> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            quality: JPEG_QUALITY,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.root.join(format!("{index}.{FRAME_EXTENSION}"))
    }
}

/// Frame index encoded in a file name like `270.jpg`.
fn parse_frame_index(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case(FRAME_EXTENSION) {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

impl FrameStore for JpegFrameStore {
    fn save(&self, frame: &Frame) -> Result<PathBuf, SendError> {
        let path = self.path_for(frame.index());
        let img = frame
            .to_rgb_image()
            .ok_or("Failed to create image from frame data")?;
        save_rgb_image(&path, &img, self.quality)?;
        Ok(path)
    }

    fn load(&self, index: usize) -> Result<Frame, SendError> {
        let img = image::open(self.path_for(index))?.to_rgb8();
        Ok(Frame::from_rgb_image(img, index))
    }

    fn indices(&self) -> Result<Vec<usize>, SendError> {
        let mut indices = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if let Some(index) = parse_frame_index(&path) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    fn remove(&self, index: usize) -> Result<(), SendError> {
        fs::remove_file(self.path_for(index))?;
        Ok(())
    }
}
