use std::time::Instant;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::{PipelineError, SendError};
use crate::shared::frame::Frame;
use crate::video::domain::frame_store::FrameStore;
use crate::video::domain::video_reader::VideoReader;

use super::frame_sampler::FrameSampler;
use super::sampling_plan::SamplingPlan;

const DEFAULT_CHANNEL_CAPACITY: usize = 4;

pub const STAGE: &str = "sample";

/// Samples frames from an opened reader into the frame store.
///
/// Layout: `decoder thread → bounded channel → main [encode + persist]`.
/// Decoding the next frame overlaps with JPEG-encoding the previous one.
pub struct SampleFramesUseCase {
    channel_capacity: usize,
}

impl SampleFramesUseCase {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Runs the plan to completion and returns the stored frame indices in
    /// capture order. The reader is closed when decoding ends.
    pub fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        plan: &SamplingPlan,
        store: &dyn FrameStore,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<usize>, PipelineError> {
        let started = Instant::now();
        let expected = plan.expected_count();
        let (frame_tx, frame_rx) =
            crossbeam_channel::bounded::<Result<Frame, SendError>>(self.channel_capacity);

        let reader_handle = spawn_reader(reader, plan.clone(), frame_tx);

        let mut stored = Vec::with_capacity(expected);
        let mut failure: Option<SendError> = None;
        for frame_result in &frame_rx {
            match frame_result.and_then(|frame| store.save(&frame).map(|_| frame.index())) {
                Ok(index) => {
                    stored.push(index);
                    logger.progress(STAGE, stored.len(), expected);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        // Unblocks the decoder thread if we stopped early.
        drop(frame_rx);

        if let Err(panic) = reader_handle.join() {
            std::panic::resume_unwind(panic);
        }

        logger.timing(STAGE, started.elapsed().as_secs_f64() * 1000.0);
        if stored.len() < expected && failure.is_none() {
            logger.info(&format!(
                "Decoder ran out of frames after {} of {expected} samples",
                stored.len()
            ));
        }

        match failure {
            Some(e) => Err(PipelineError::stage(STAGE, e)),
            None => Ok(stored),
        }
    }
}

impl Default for SampleFramesUseCase {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    plan: SamplingPlan,
    frame_tx: crossbeam_channel::Sender<Result<Frame, SendError>>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for frame_result in FrameSampler::new(reader.as_mut(), &plan) {
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
        reader.close();
    })
}
