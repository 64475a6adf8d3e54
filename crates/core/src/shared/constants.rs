/// Default time between sampled frames.
pub const DEFAULT_INTERVAL_MS: u64 = 3000;

/// Hamming distance below which two consecutive frames count as duplicates.
pub const DEFAULT_DUPLICATE_THRESHOLD: u32 = 5;

/// Columns ignored at each horizontal edge when testing for a blank row.
/// Videos often carry shading or vignetting there.
pub const BACKGROUND_EDGE_MARGIN: u32 = 10;

pub const BACKGROUND_RGB: [u8; 3] = [255, 255, 255];

/// Page height over page width for ISO A-series portrait paper.
pub const PAGE_HEIGHT_RATIO: f64 = 842.0 / 595.0;

/// A4 in PDF points (1/72 inch).
pub const A4_WIDTH_PT: f64 = 595.0;
pub const A4_HEIGHT_PT: f64 = 842.0;

pub const FRAME_EXTENSION: &str = "jpg";
pub const DOCUMENT_EXTENSION: &str = "pdf";

pub const JPEG_QUALITY: u8 = 90;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov", "avi"];
