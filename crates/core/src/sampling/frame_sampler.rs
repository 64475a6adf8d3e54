use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;

use super::sampling_plan::SamplingPlan;

/// Lazily decodes the frames named by a [`SamplingPlan`].
///
/// The first index the decoder cannot produce ends the sequence; this is
/// expected near the end of a trimmed video and is not an error. A decode
/// error is yielded once and also ends the sequence.
pub struct FrameSampler<'a> {
    reader: &'a mut dyn VideoReader,
    indices: Box<dyn Iterator<Item = usize> + Send + 'a>,
    exhausted: bool,
}

impl<'a> FrameSampler<'a> {
    pub fn new(reader: &'a mut dyn VideoReader, plan: &SamplingPlan) -> Self {
        Self {
            reader,
            indices: Box::new(plan.indices()),
            exhausted: false,
        }
    }
}

impl Iterator for FrameSampler<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let index = self.indices.next()?;
        match self.reader.frame_at(index) {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                log::info!("Ran out of frames to read at frame {index}");
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}
