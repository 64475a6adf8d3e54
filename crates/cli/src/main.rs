use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};

use sheetgrab_core::composition::infrastructure::pdf_document_writer::PdfDocumentWriter;
use sheetgrab_core::cropping::infrastructure::background_row_estimator::BackgroundRowEstimator;
use sheetgrab_core::dedup::infrastructure::dct_fingerprinter::DctFingerprinter;
use sheetgrab_core::pipeline::grab_sheets_use_case::{
    GrabOptions, GrabReport, GrabSheetsUseCase, OutputMode,
};
use sheetgrab_core::pipeline::pipeline_logger::{
    NullPipelineLogger, PipelineLogger, StdoutPipelineLogger,
};
use sheetgrab_core::pipeline::run_context::RunContext;
use sheetgrab_core::shared::constants::{
    DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_INTERVAL_MS, JPEG_QUALITY, VIDEO_EXTENSIONS,
};
use sheetgrab_core::shared::crop_band::CropBand;
use sheetgrab_core::shared::trim_range::TrimRange;
use sheetgrab_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use sheetgrab_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Turns a scrolling sheet music video into page images and a PDF.
#[derive(Parser, Debug)]
#[command(name = "sheetgrab", version)]
struct Cli {
    /// Downloaded video file.
    input: PathBuf,

    /// Base name for outputs (defaults to the video file name).
    #[arg(long)]
    name: Option<String>,

    /// Milliseconds between sampled frames.
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS)]
    interval: u64,

    /// Rows to keep as TOP-BOTTOM, e.g. 120-860 (skips estimation).
    #[arg(long)]
    crop: Option<CropBand>,

    /// Only sample between two timestamps, e.g. 0:15-3:40.
    #[arg(long)]
    trim: Option<TrimRange>,

    /// What to write.
    #[arg(long, value_enum, default_value_t = OutputArg::Pdf)]
    output: OutputArg,

    /// Directory for outputs and the working frames.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Keep the sampled frames after the run.
    #[arg(long)]
    preserve_frames: bool,

    /// Fingerprint distance below which consecutive frames are merged.
    #[arg(long, default_value_t = DEFAULT_DUPLICATE_THRESHOLD)]
    threshold: u32,

    /// JPEG quality (1-100) of the stitched image and the PDF pages.
    #[arg(long, default_value_t = JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Only print warnings and errors.
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputArg {
    /// Paginated A4 PDF.
    Pdf,
    /// One tall JPEG.
    Jpg,
    Both,
}

impl From<OutputArg> for OutputMode {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Pdf => OutputMode::PaginatedDocument,
            OutputArg::Jpg => OutputMode::SingleImage,
            OutputArg::Both => OutputMode::Both,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    validate(&cli)?;

    let context = RunContext::new(&cli.input, cli.name.as_deref(), &cli.out_dir);
    let options = grab_options(&cli);

    let mut logger: Box<dyn PipelineLogger> = if cli.quiet {
        Box::new(NullPipelineLogger)
    } else {
        Box::new(StdoutPipelineLogger::default())
    };

    let mut use_case = GrabSheetsUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(BackgroundRowEstimator::new()),
        Box::new(DctFingerprinter::new()),
        Box::new(ImageFileWriter::new().with_jpeg_quality(cli.jpeg_quality)),
        Box::new(PdfDocumentWriter::new().with_jpeg_quality(cli.jpeg_quality)),
    );
    let report = use_case.execute(&context, &options, logger.as_mut())?;

    logger.summary();
    print_report(&report);
    Ok(())
}

fn grab_options(cli: &Cli) -> GrabOptions {
    GrabOptions {
        interval_ms: cli.interval,
        crop: cli.crop,
        trim: cli.trim,
        output: cli.output.into(),
        preserve_frames: cli.preserve_frames,
        duplicate_threshold: cli.threshold,
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.interval == 0 {
        return Err("Interval must be a positive number of milliseconds".into());
    }
    if let Some(name) = &cli.name {
        if name.contains(['/', '\\']) {
            return Err(format!("Name must not contain path separators, got '{name}'").into());
        }
    }
    if cli.out_dir.is_file() {
        return Err(format!("Output directory is a file: {}", cli.out_dir.display()).into());
    }
    if !is_video(&cli.input) {
        log::warn!(
            "{} does not look like a video file, trying anyway",
            cli.input.display()
        );
    }
    Ok(())
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn print_report(report: &GrabReport) {
    let crop = report
        .crop_band
        .map_or_else(|| "none".to_string(), |band| band.to_string());
    log::info!(
        "Sampled {} frames, cropped to {crop}, removed {} duplicates",
        report.frames_sampled,
        report.frames_removed
    );
    for path in report.image_path.iter().chain(report.document_path.iter()) {
        println!("{}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("sheetgrab").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["song.mp4"]).unwrap();

        assert_eq!(cli.input, PathBuf::from("song.mp4"));
        assert_eq!(cli.interval, DEFAULT_INTERVAL_MS);
        assert_eq!(cli.output, OutputArg::Pdf);
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert!(cli.crop.is_none());
        assert!(cli.trim.is_none());
        assert!(!cli.preserve_frames);
        assert!(!cli.quiet);
        assert_eq!(cli.jpeg_quality, JPEG_QUALITY);
        assert_eq!(grab_options(&cli), GrabOptions::default());
    }

    #[test]
    fn test_all_flags() {
        let cli = parse(&[
            "song.mp4",
            "--name",
            "Prelude",
            "--interval",
            "1500",
            "--crop",
            "120-860",
            "--trim",
            "0:15-3:40",
            "--output",
            "both",
            "--out-dir",
            "/tmp/sheets",
            "--preserve-frames",
            "--threshold",
            "8",
            "--jpeg-quality",
            "60",
            "--quiet",
        ])
        .unwrap();

        let options = grab_options(&cli);
        assert_eq!(cli.name.as_deref(), Some("Prelude"));
        assert_eq!(options.interval_ms, 1500);
        assert_eq!(options.crop, Some(CropBand::new(120, 860).unwrap()));
        assert_eq!(options.trim, Some(TrimRange::new(15, 220).unwrap()));
        assert_eq!(options.output, OutputMode::Both);
        assert_eq!(options.duplicate_threshold, 8);
        assert!(options.preserve_frames);
        assert_eq!(cli.jpeg_quality, 60);
        assert!(cli.quiet);
    }

    #[test]
    fn test_jpg_output() {
        let cli = parse(&["song.mp4", "--output", "jpg"]).unwrap();
        assert_eq!(OutputMode::from(cli.output), OutputMode::SingleImage);
    }

    #[test]
    fn test_rejects_bad_crop() {
        assert!(parse(&["song.mp4", "--crop", "860-120"]).is_err());
        assert!(parse(&["song.mp4", "--crop", "top"]).is_err());
    }

    #[test]
    fn test_rejects_bad_trim() {
        assert!(parse(&["song.mp4", "--trim", "1:00-0:30"]).is_err());
        assert!(parse(&["song.mp4", "--trim", "1:0:0-2:00"]).is_err());
    }

    #[test]
    fn test_rejects_jpeg_quality_out_of_range() {
        assert!(parse(&["song.mp4", "--jpeg-quality", "0"]).is_err());
        assert!(parse(&["song.mp4", "--jpeg-quality", "101"]).is_err());
        assert!(parse(&["song.mp4", "--jpeg-quality", "100"]).is_ok());
    }

    #[test]
    fn test_rejects_unknown_output() {
        assert!(parse(&["song.mp4", "--output", "png"]).is_err());
    }

    #[test]
    fn test_input_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let cli = parse(&["song.mp4", "--interval", "0"]).unwrap();
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_validate_rejects_name_with_separator() {
        let cli = parse(&["song.mp4", "--name", "a/b"]).unwrap();
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_validate_rejects_file_as_out_dir() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let out = file.path().to_str().unwrap();
        let cli = parse(&["song.mp4", "--out-dir", out]).unwrap();
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_is_video() {
        assert!(is_video(Path::new("clip.MP4")));
        assert!(is_video(Path::new("clip.webm")));
        assert!(!is_video(Path::new("notes.txt")));
        assert!(!is_video(Path::new("noext")));
    }
}
