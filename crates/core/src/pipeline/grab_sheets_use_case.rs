use std::fs;
use std::time::Instant;

use crate::composition::compose_pages_use_case::ComposePagesUseCase;
use crate::composition::domain::document_writer::DocumentWriter;
use crate::cropping::crop_frames_use_case::CropFramesUseCase;
use crate::cropping::domain::crop_estimator::CropBoundEstimator;
use crate::dedup::deduplicate_frames_use_case::DeduplicateFramesUseCase;
use crate::dedup::domain::fingerprinter::Fingerprinter;
use crate::sampling::sample_frames_use_case::SampleFramesUseCase;
use crate::sampling::sampling_plan::SamplingPlan;
use crate::shared::constants::{DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_INTERVAL_MS};
use crate::shared::crop_band::CropBand;
use crate::shared::error::{PipelineError, SendError};
use crate::shared::trim_range::TrimRange;
use crate::video::domain::frame_store::FrameStore;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;
use crate::video::infrastructure::jpeg_frame_store::JpegFrameStore;

use super::pipeline_logger::PipelineLogger;
use super::run_context::RunContext;

/// Which composed outputs a run produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// One tall `.jpg` with every frame stacked.
    SingleImage,
    /// A4 `.pdf` with frames packed onto pages.
    #[default]
    PaginatedDocument,
    Both,
}

impl OutputMode {
    pub fn writes_image(self) -> bool {
        matches!(self, Self::SingleImage | Self::Both)
    }

    pub fn writes_document(self) -> bool {
        matches!(self, Self::PaginatedDocument | Self::Both)
    }
}

/// Per-run settings.
#[derive(Clone, Debug, PartialEq)]
pub struct GrabOptions {
    pub interval_ms: u64,
    /// Explicit band; when `None` the band is estimated from the first frame.
    pub crop: Option<CropBand>,
    pub trim: Option<TrimRange>,
    pub output: OutputMode,
    pub preserve_frames: bool,
    pub duplicate_threshold: u32,
}

impl Default for GrabOptions {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            crop: None,
            trim: None,
            output: OutputMode::default(),
            preserve_frames: false,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

/// Outcome of a completed run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrabReport {
    pub frames_sampled: usize,
    pub crop_band: Option<CropBand>,
    pub frames_removed: usize,
    pub pages: usize,
    pub image_path: Option<std::path::PathBuf>,
    pub document_path: Option<std::path::PathBuf>,
}

/// Runs sample → crop → dedup → compose for one video.
///
/// This is a single-use struct: `execute` hands the reader to the sampling
/// thread, so calling it twice will fail.
pub struct GrabSheetsUseCase {
    reader: Option<Box<dyn VideoReader>>,
    estimator: Box<dyn CropBoundEstimator>,
    fingerprinter: Box<dyn Fingerprinter>,
    compose: ComposePagesUseCase,
}

impl GrabSheetsUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        estimator: Box<dyn CropBoundEstimator>,
        fingerprinter: Box<dyn Fingerprinter>,
        image_writer: Box<dyn ImageWriter>,
        document_writer: Box<dyn DocumentWriter>,
    ) -> Self {
        Self {
            reader: Some(reader),
            estimator,
            fingerprinter,
            compose: ComposePagesUseCase::new(image_writer, document_writer),
        }
    }

    pub fn execute(
        &mut self,
        context: &RunContext,
        options: &GrabOptions,
        logger: &mut dyn PipelineLogger,
    ) -> Result<GrabReport, PipelineError> {
        let video_path = context.video_path();
        if !video_path.is_file() {
            return Err(PipelineError::MissingVideo(video_path.to_path_buf()));
        }
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| PipelineError::stage("open", "Pipeline already executed".into()))?;

        let started = Instant::now();
        let metadata = reader
            .open(video_path)
            .map_err(|e| PipelineError::stage("open", e))?;
        logger.timing("open", started.elapsed().as_secs_f64() * 1000.0);
        log::info!(
            "Opened {} ({}, {}x{}, {:.2} fps, {} frames, {:.1}s)",
            video_path.display(),
            metadata.codec,
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.duration_secs()
        );

        let plan = SamplingPlan::for_video(&metadata, options.interval_ms, options.trim.as_ref())?;
        let store = open_store(context)?;

        let sampled = SampleFramesUseCase::new().execute(reader, &plan, &store, logger)?;
        let Some(&first) = sampled.first() else {
            return Err(PipelineError::NoFrames(video_path.to_path_buf()));
        };

        let band = match options.crop {
            Some(band) => Some(band),
            None => {
                let frame = store
                    .load(first)
                    .map_err(|e| PipelineError::stage("estimate", e))?;
                self.estimator.estimate(&frame)
            }
        };
        let crop_band = match band {
            Some(band) => CropFramesUseCase.execute(&store, band, logger)?,
            None => {
                logger.info("No crop band found, keeping full frames");
                None
            }
        };

        let removed = DeduplicateFramesUseCase::new()
            .with_threshold(options.duplicate_threshold)
            .execute(&store, self.fingerprinter.as_ref(), logger)?;

        let composition = self.compose.execute(
            &store,
            options.output.writes_image().then(|| context.image_path()),
            options.output.writes_document().then(|| context.document_path()),
            logger,
        )?;

        if options.preserve_frames {
            logger.info(&format!("Keeping frames in {}", context.frames_dir().display()));
        } else {
            remove_frames(&store).map_err(|e: SendError| PipelineError::stage("cleanup", e))?;
        }

        Ok(GrabReport {
            frames_sampled: sampled.len(),
            crop_band,
            frames_removed: removed.len(),
            pages: composition.pages,
            image_path: composition.image,
            document_path: composition.document,
        })
    }
}

/// Opens the working directory, dropping frames left over from an earlier
/// run so they cannot mix with this one.
fn open_store(context: &RunContext) -> Result<JpegFrameStore, PipelineError> {
    let stage = |e: SendError| PipelineError::stage("sample", e);
    let store = JpegFrameStore::create(context.frames_dir()).map_err(stage)?;
    let stale = store.indices().map_err(stage)?;
    if !stale.is_empty() {
        log::warn!(
            "Removing {} stale frames from {}",
            stale.len(),
            context.frames_dir().display()
        );
        for index in stale {
            store.remove(index).map_err(stage)?;
        }
    }
    Ok(store)
}

/// Deletes the frames this run wrote, then the directory if nothing else is
/// left in it.
fn remove_frames(store: &JpegFrameStore) -> Result<(), SendError> {
    for index in store.indices()? {
        store.remove(index)?;
    }
    if fs::read_dir(store.root())?.next().is_none() {
        fs::remove_dir(store.root())?;
    } else {
        log::info!(
            "Leaving {} in place, it holds files besides frames",
            store.root().display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::infrastructure::pdf_document_writer::PdfDocumentWriter;
    use crate::cropping::infrastructure::background_row_estimator::BackgroundRowEstimator;
    use crate::dedup::infrastructure::dct_fingerprinter::DctFingerprinter;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::error::ValidationError;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::infrastructure::image_file_writer::ImageFileWriter;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 48;

    /// 30 fps clip whose picture switches between a pattern and its
    /// negative every 100 frames.
    struct ScrollingReader {
        total_frames: usize,
    }

    impl VideoReader for ScrollingReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(VideoMetadata {
                width: WIDTH,
                height: HEIGHT,
                fps: 30.0,
                total_frames: self.total_frames,
                codec: "stub".into(),
            })
        }

        fn frame_at(
            &mut self,
            index: usize,
        ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            if index >= self.total_frames {
                return Ok(None);
            }
            let invert = (index / 100) % 2 == 1;
            let mut data = Vec::with_capacity((WIDTH * HEIGHT * 3) as usize);
            for y in 0..HEIGHT {
                for x in 0..WIDTH {
                    let v = ((x * 7 + y * 13) % 256) as u8;
                    let v = if invert { 255 - v } else { v };
                    data.extend_from_slice(&[v, v, v]);
                }
            }
            Ok(Some(Frame::new(data, WIDTH, HEIGHT, 3, index)))
        }

        fn close(&mut self) {}
    }

    /// White sheet between dark bars on rows `0..8` and `40..48`, the same
    /// picture on every frame.
    struct LetterboxedReader {
        total_frames: usize,
    }

    impl VideoReader for LetterboxedReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            ScrollingReader {
                total_frames: self.total_frames,
            }
            .open(path)
        }

        fn frame_at(
            &mut self,
            index: usize,
        ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            if index >= self.total_frames {
                return Ok(None);
            }
            let mut data = Vec::with_capacity((WIDTH * HEIGHT * 3) as usize);
            for y in 0..HEIGHT {
                let v = if (8..40).contains(&y) { 255 } else { 20 };
                data.extend(std::iter::repeat(v).take((WIDTH * 3) as usize));
            }
            Ok(Some(Frame::new(data, WIDTH, HEIGHT, 3, index)))
        }

        fn close(&mut self) {}
    }

    fn grabber(total_frames: usize) -> GrabSheetsUseCase {
        grabber_with(Box::new(ScrollingReader { total_frames }))
    }

    fn grabber_with(reader: Box<dyn VideoReader>) -> GrabSheetsUseCase {
        GrabSheetsUseCase::new(
            reader,
            Box::new(BackgroundRowEstimator::new()),
            Box::new(DctFingerprinter::new()),
            Box::new(ImageFileWriter::new()),
            Box::new(PdfDocumentWriter::new()),
        )
    }

    fn context_in(dir: &TempDir) -> RunContext {
        let video = dir.path().join("song.mp4");
        fs::write(&video, b"not really a video").unwrap();
        RunContext::new(&video, None, &dir.path().join("out"))
    }

    fn frame_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_missing_video_fails_before_any_output() {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(&dir.path().join("gone.mp4"), None, dir.path());

        let err = grabber(300)
            .execute(&ctx, &GrabOptions::default(), &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(err, PipelineError::MissingVideo(_)));
        assert!(!ctx.frames_dir().exists());
    }

    #[test]
    fn test_full_run_writes_document_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir);
        let options = GrabOptions {
            interval_ms: 1000,
            ..Default::default()
        };

        let report = grabber(300)
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .unwrap();

        // Samples 0, 30, ..., 270; one survivor per 100-frame scene.
        assert_eq!(report.frames_sampled, 10);
        assert_eq!(report.frames_removed, 7);
        assert_eq!(report.crop_band, None);
        // 48 px frames on 91 px pages: one frame per page.
        assert_eq!(report.pages, 3);
        assert_eq!(report.document_path.as_deref(), Some(ctx.document_path()));
        assert!(ctx.document_path().is_file());
        assert!(!ctx.image_path().exists());
        assert!(!ctx.frames_dir().exists());
        assert!(ctx.video_path().is_file());
    }

    #[test]
    fn test_crop_override_and_preserved_frames() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir);
        let options = GrabOptions {
            interval_ms: 1000,
            crop: Some(CropBand::new(10, 40).unwrap()),
            output: OutputMode::SingleImage,
            preserve_frames: true,
            ..Default::default()
        };

        let report = grabber(300)
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(report.crop_band, Some(CropBand::new(10, 40).unwrap()));
        assert_eq!(report.pages, 0);
        let kept = frame_files(ctx.frames_dir());
        assert_eq!(
            kept,
            vec![
                ctx.frames_dir().join("0.jpg"),
                ctx.frames_dir().join("120.jpg"),
                ctx.frames_dir().join("210.jpg"),
            ]
        );
        let stitched = image::open(ctx.image_path()).unwrap();
        assert_eq!((stitched.width(), stitched.height()), (WIDTH, 90));
        assert!(!ctx.document_path().exists());
    }

    #[test]
    fn test_estimated_band_crops_stored_frames() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir);
        let options = GrabOptions {
            interval_ms: 1000,
            output: OutputMode::Both,
            preserve_frames: true,
            ..Default::default()
        };

        let report = grabber_with(Box::new(LetterboxedReader { total_frames: 300 }))
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(report.crop_band, Some(CropBand::new(8, 40).unwrap()));
        // Identical sheets collapse to the first one.
        assert_eq!(report.frames_removed, 9);
        assert_eq!(frame_files(ctx.frames_dir()), vec![ctx.frames_dir().join("0.jpg")]);
        let kept = image::open(ctx.frames_dir().join("0.jpg")).unwrap();
        assert_eq!((kept.width(), kept.height()), (WIDTH, 32));
        let stitched = image::open(ctx.image_path()).unwrap();
        assert_eq!(stitched.height(), 32);
    }

    #[test]
    fn test_cleanup_spares_files_next_to_frames() {
        let dir = TempDir::new().unwrap();
        let song_dir = dir.path().join("song");
        fs::create_dir(&song_dir).unwrap();
        let video = song_dir.join("song.mp4");
        fs::write(&video, b"not really a video").unwrap();
        fs::write(song_dir.join("notes.txt"), b"fingering").unwrap();
        // Working directory and the video's folder are the same path.
        let ctx = RunContext::new(&video, None, dir.path());
        assert_eq!(ctx.frames_dir(), song_dir.as_path());
        let options = GrabOptions {
            interval_ms: 1000,
            ..Default::default()
        };

        grabber(300)
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .unwrap();

        assert!(video.is_file());
        assert!(song_dir.join("notes.txt").is_file());
        assert_eq!(
            frame_files(&song_dir),
            vec![song_dir.join("notes.txt"), video.clone()]
        );
        assert!(ctx.document_path().is_file());
    }

    #[test]
    fn test_trim_limits_sampling_window() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir);
        let options = GrabOptions {
            interval_ms: 1000,
            trim: Some(TrimRange::new(4, 6).unwrap()),
            output: OutputMode::Both,
            ..Default::default()
        };

        let report = grabber(300)
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .unwrap();

        // Frames 120 and 150, both in the second scene.
        assert_eq!(report.frames_sampled, 2);
        assert_eq!(report.frames_removed, 1);
        assert!(ctx.image_path().is_file());
        assert!(ctx.document_path().is_file());
    }

    #[test]
    fn test_invalid_interval_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir);
        let options = GrabOptions {
            interval_ms: 0,
            ..Default::default()
        };

        let err = grabber(300)
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::ZeroInterval(0))
        ));
        assert!(!ctx.frames_dir().exists());
    }

    #[test]
    fn test_empty_video_reports_no_frames() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir);

        let err = grabber(0)
            .execute(&ctx, &GrabOptions::default(), &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoFrames(_)));
    }

    #[test]
    fn test_stale_frames_are_cleared() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir);
        let stale = JpegFrameStore::create(ctx.frames_dir()).unwrap();
        stale.save(&Frame::filled(WIDTH, HEIGHT, [0, 0, 0], 9999)).unwrap();
        let options = GrabOptions {
            interval_ms: 1000,
            preserve_frames: true,
            ..Default::default()
        };

        grabber(300)
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .unwrap();

        assert!(!ctx.frames_dir().join("9999.jpg").exists());
    }

    #[test]
    fn test_second_execute_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(&dir);
        let options = GrabOptions {
            interval_ms: 1000,
            ..Default::default()
        };
        let mut grabber = grabber(300);

        grabber
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .unwrap();
        assert!(grabber
            .execute(&ctx, &options, &mut NullPipelineLogger)
            .is_err());
    }

    #[test]
    fn test_output_mode_flags() {
        assert!(OutputMode::SingleImage.writes_image());
        assert!(!OutputMode::SingleImage.writes_document());
        assert!(OutputMode::PaginatedDocument.writes_document());
        assert!(!OutputMode::PaginatedDocument.writes_image());
        assert!(OutputMode::Both.writes_image() && OutputMode::Both.writes_document());
        assert_eq!(OutputMode::default(), OutputMode::PaginatedDocument);
    }
}
