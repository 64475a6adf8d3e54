use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::video::domain::frame_store::FrameStore;
use crate::video::domain::image_writer::ImageWriter;

use super::domain::document_writer::DocumentWriter;
use super::domain::page_compositor::PageCompositor;

pub const STAGE: &str = "compose";

/// What the compose stage wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composition {
    pub image: Option<PathBuf>,
    pub document: Option<PathBuf>,
    pub pages: usize,
}

/// Loads the surviving frames in capture order and writes the tall image,
/// the paginated document, or both.
pub struct ComposePagesUseCase {
    image_writer: Box<dyn ImageWriter>,
    document_writer: Box<dyn DocumentWriter>,
}

impl ComposePagesUseCase {
    pub fn new(
        image_writer: Box<dyn ImageWriter>,
        document_writer: Box<dyn DocumentWriter>,
    ) -> Self {
        Self {
            image_writer,
            document_writer,
        }
    }

    pub fn execute(
        &self,
        store: &dyn FrameStore,
        image_path: Option<&Path>,
        document_path: Option<&Path>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Composition, PipelineError> {
        let started = Instant::now();
        let frames = load_all(store, logger)?;
        if frames.is_empty() {
            return Err(PipelineError::stage(STAGE, "no frames left to compose".into()));
        }

        let mut composition = Composition::default();

        if let Some(path) = image_path {
            let stacked = PageCompositor.stack(&frames);
            self.image_writer
                .write(path, &stacked)
                .map_err(|e| PipelineError::stage(STAGE, e))?;
            logger.info(&format!(
                "Wrote {}x{} image to {}",
                stacked.width(),
                stacked.height(),
                path.display()
            ));
            composition.image = Some(path.to_path_buf());
        }

        if let Some(path) = document_path {
            let pages = PageCompositor.paginate(&frames);
            self.document_writer
                .write(path, &pages)
                .map_err(|e| PipelineError::stage(STAGE, e))?;
            logger.info(&format!("Wrote {} pages to {}", pages.len(), path.display()));
            composition.pages = pages.len();
            composition.document = Some(path.to_path_buf());
        }

        logger.timing(STAGE, started.elapsed().as_secs_f64() * 1000.0);
        Ok(composition)
    }
}

fn load_all(
    store: &dyn FrameStore,
    logger: &mut dyn PipelineLogger,
) -> Result<Vec<Frame>, PipelineError> {
    let indices = store
        .indices()
        .map_err(|e| PipelineError::stage(STAGE, e))?;
    let mut frames = Vec::with_capacity(indices.len());
    for (i, &index) in indices.iter().enumerate() {
        frames.push(store.load(index).map_err(|e| PipelineError::stage(STAGE, e))?);
        logger.progress(STAGE, i + 1, indices.len());
    }
    Ok(frames)
}
