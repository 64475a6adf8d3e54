use std::time::Instant;

use rayon::prelude::*;

use crate::pipeline::pipeline_logger::{ParallelProgress, PipelineLogger};
use crate::shared::constants::DEFAULT_DUPLICATE_THRESHOLD;
use crate::shared::error::{PipelineError, SendError};
use crate::video::domain::frame_store::FrameStore;

use super::domain::duplicate_filter::find_duplicates;
use super::domain::fingerprinter::{Fingerprint, Fingerprinter};

pub const STAGE: &str = "dedup";

/// Removes stored frames that repeat their predecessor.
///
/// Fingerprints are computed in parallel; files are deleted only after the
/// whole sequence has been compared.
pub struct DeduplicateFramesUseCase {
    threshold: u32,
}

impl DeduplicateFramesUseCase {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Returns the frame indices that were removed, ascending.
    pub fn execute(
        &self,
        store: &dyn FrameStore,
        fingerprinter: &dyn Fingerprinter,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Vec<usize>, PipelineError> {
        let started = Instant::now();
        let indices = store
            .indices()
            .map_err(|e| PipelineError::stage(STAGE, e))?;

        let progress = ParallelProgress::new(logger, STAGE, indices.len());
        let fingerprints = indices
            .par_iter()
            .map(|&index| -> Result<Fingerprint, SendError> {
                let fingerprint = fingerprinter.fingerprint(&store.load(index)?)?;
                progress.tick();
                Ok(fingerprint)
            })
            .collect::<Result<Vec<_>, _>>();
        drop(progress);
        let fingerprints = fingerprints.map_err(|e| PipelineError::stage(STAGE, e))?;

        for pair in fingerprints.windows(2) {
            logger.metric("fingerprint_distance", pair[0].distance(&pair[1]) as f64);
        }

        let removed: Vec<usize> = find_duplicates(&fingerprints, self.threshold)
            .into_iter()
            .map(|position| indices[position])
            .collect();
        for &index in &removed {
            log::debug!("Removing frame {index}, duplicate of its predecessor");
            store
                .remove(index)
                .map_err(|e| PipelineError::stage(STAGE, e))?;
        }

        logger.timing(STAGE, started.elapsed().as_secs_f64() * 1000.0);
        logger.info(&format!(
            "Removed {} duplicate frames, {} remain",
            removed.len(),
            indices.len() - removed.len()
        ));
        Ok(removed)
    }
}

impl Default for DeduplicateFramesUseCase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::{NullPipelineLogger, StdoutPipelineLogger};
    use crate::shared::frame::Frame;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Stores frames by index; the red channel of the first pixel is used as
    /// the fingerprint by [`RedChannelFingerprinter`].
    #[derive(Default)]
    struct MemoryStore {
        frames: Mutex<BTreeMap<usize, Frame>>,
    }

    impl MemoryStore {
        fn with_red_values(values: &[(usize, u8)]) -> Self {
            let store = Self::default();
            for &(index, red) in values {
                store
                    .frames
                    .lock()
                    .unwrap()
                    .insert(index, Frame::filled(2, 2, [red, 0, 0], index));
            }
            store
        }
    }

    impl FrameStore for MemoryStore {
        fn save(&self, frame: &Frame) -> Result<PathBuf, SendError> {
            self.frames.lock().unwrap().insert(frame.index(), frame.clone());
            Ok(PathBuf::new())
        }

        fn load(&self, index: usize) -> Result<Frame, SendError> {
            self.frames
                .lock()
                .unwrap()
                .get(&index)
                .cloned()
                .ok_or_else(|| format!("no frame {index}").into())
        }

        fn indices(&self) -> Result<Vec<usize>, SendError> {
            Ok(self.frames.lock().unwrap().keys().copied().collect())
        }

        fn remove(&self, index: usize) -> Result<(), SendError> {
            self.frames.lock().unwrap().remove(&index);
            Ok(())
        }
    }

    /// Uses the red channel as the hash bits: 0 and 31 differ in 5 bits,
    /// 0 and 255 in 8.
    struct RedChannelFingerprinter;

    impl Fingerprinter for RedChannelFingerprinter {
        fn fingerprint(&self, frame: &Frame) -> Result<Fingerprint, SendError> {
            Ok(Fingerprint(frame.data()[0] as u64))
        }
    }

    struct FailingFingerprinter;

    impl Fingerprinter for FailingFingerprinter {
        fn fingerprint(&self, _frame: &Frame) -> Result<Fingerprint, SendError> {
            Err("decoder gave up".into())
        }
    }

    #[test]
    fn test_removes_repeats_of_predecessor() {
        let store =
            MemoryStore::with_red_values(&[(0, 0), (90, 0), (180, 255), (270, 255), (360, 0)]);

        let removed = DeduplicateFramesUseCase::new()
            .execute(&store, &RedChannelFingerprinter, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(removed, vec![90, 270]);
        assert_eq!(store.indices().unwrap(), vec![0, 180, 360]);
    }

    #[test]
    fn test_distance_of_exactly_five_keeps_both() {
        let store = MemoryStore::with_red_values(&[(0, 0), (90, 31)]);

        let removed = DeduplicateFramesUseCase::new()
            .execute(&store, &RedChannelFingerprinter, &mut NullPipelineLogger)
            .unwrap();

        assert!(removed.is_empty());
        assert_eq!(store.indices().unwrap(), vec![0, 90]);
    }

    #[test]
    fn test_first_frame_survives_a_run_of_identical_frames() {
        let store = MemoryStore::with_red_values(&[(0, 9), (90, 9), (180, 9)]);

        DeduplicateFramesUseCase::new()
            .execute(&store, &RedChannelFingerprinter, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(store.indices().unwrap(), vec![0]);
    }

    #[test]
    fn test_fingerprint_failure_deletes_nothing() {
        let store = MemoryStore::with_red_values(&[(0, 1), (90, 1)]);

        let err = DeduplicateFramesUseCase::new()
            .execute(&store, &FailingFingerprinter, &mut NullPipelineLogger)
            .unwrap_err();

        assert!(err.to_string().contains("decoder gave up"));
        assert_eq!(store.indices().unwrap(), vec![0, 90]);
    }

    #[test]
    fn test_records_pairwise_distances() {
        let store = MemoryStore::with_red_values(&[(0, 0), (90, 31), (180, 31)]);
        let mut logger = StdoutPipelineLogger::new(10);

        DeduplicateFramesUseCase::new()
            .execute(&store, &RedChannelFingerprinter, &mut logger)
            .unwrap();

        assert_eq!(
            logger.metrics_for("fingerprint_distance").unwrap(),
            &[5.0, 0.0]
        );
    }

    #[test]
    fn test_custom_threshold() {
        let store = MemoryStore::with_red_values(&[(0, 0), (90, 31)]);

        let removed = DeduplicateFramesUseCase::new()
            .with_threshold(6)
            .execute(&store, &RedChannelFingerprinter, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(removed, vec![90]);
    }
}
