use std::path::{Path, PathBuf};

use crate::shared::constants::{DOCUMENT_EXTENSION, FRAME_EXTENSION};

const FALLBACK_BASE_NAME: &str = "sheets";

/// Where one grab run reads from and writes to. Fixed before the first
/// stage starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunContext {
    base_name: String,
    video_path: PathBuf,
    frames_dir: PathBuf,
    image_path: PathBuf,
    document_path: PathBuf,
}

impl RunContext {
    /// Lays out `<out_dir>/<base>/`, `<out_dir>/<base>.jpg` and
    /// `<out_dir>/<base>.pdf`.
    ///
    /// The base name is `name` when given, otherwise the video's file stem.
    pub fn new(video_path: &Path, name: Option<&str>, out_dir: &Path) -> Self {
        let base_name = base_name_for(video_path, name);
        Self {
            frames_dir: out_dir.join(&base_name),
            image_path: out_dir.join(format!("{base_name}.{FRAME_EXTENSION}")),
            document_path: out_dir.join(format!("{base_name}.{DOCUMENT_EXTENSION}")),
            video_path: video_path.to_path_buf(),
            base_name,
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// Working directory holding `<frame_index>.jpg` files.
    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }
}

fn base_name_for(video_path: &Path, name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            video_path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_BASE_NAME.to_string())
}
