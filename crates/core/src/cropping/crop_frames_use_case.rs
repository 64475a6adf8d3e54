use std::time::Instant;

use rayon::prelude::*;

use crate::pipeline::pipeline_logger::{ParallelProgress, PipelineLogger};
use crate::shared::crop_band::CropBand;
use crate::shared::error::{PipelineError, SendError};
use crate::video::domain::frame_store::FrameStore;

pub const STAGE: &str = "crop";

/// Rewrites every stored frame to the rows of a crop band.
///
/// The band is clamped against the first frame before any file is touched,
/// so an unusable band leaves the working set unchanged. A band covering the
/// whole frame is reported without re-encoding anything. Otherwise frames are
/// cropped in parallel, each worker owning one file.
pub struct CropFramesUseCase;

impl CropFramesUseCase {
    /// Returns the band as clamped to the first frame, or `None` when the
    /// store is empty.
    pub fn execute(
        &self,
        store: &dyn FrameStore,
        band: CropBand,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Option<CropBand>, PipelineError> {
        let started = Instant::now();
        let indices = store
            .indices()
            .map_err(|e| PipelineError::stage(STAGE, e))?;
        let Some(&first) = indices.first() else {
            return Ok(None);
        };

        let first_frame = store.load(first).map_err(|e| PipelineError::stage(STAGE, e))?;
        let applied = band.clamp_to(first_frame.height())?;
        if applied.is_full_height(first_frame.height()) {
            logger.timing(STAGE, started.elapsed().as_secs_f64() * 1000.0);
            log::debug!("Band {applied} keeps every row, frames left as they are");
            return Ok(Some(applied));
        }
        drop(first_frame);

        let progress = ParallelProgress::new(logger, STAGE, indices.len());
        let result = indices.par_iter().try_for_each(|&index| -> Result<(), SendError> {
            let frame = store.load(index)?;
            let clamped = band.clamp_to(frame.height())?;
            store.save(&frame.crop_rows(clamped.top(), clamped.bottom()))?;
            progress.tick();
            Ok(())
        });
        drop(progress);

        logger.timing(STAGE, started.elapsed().as_secs_f64() * 1000.0);
        result.map_err(|e| PipelineError::stage(STAGE, e))?;
        log::info!("Cropped {} frames to rows {applied}", indices.len());
        Ok(Some(applied))
    }
}
