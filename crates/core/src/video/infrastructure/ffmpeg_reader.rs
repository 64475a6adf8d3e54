use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Decodes individual video frames by index via ffmpeg-next
/// (libavformat + libavcodec).
///
/// Each request seeks to the nearest keyframe at or before the target and
/// decodes forward until the requested index, then converts it to RGB24.
pub struct FfmpegReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    video_stream_index: usize,
    time_base: f64,
    start_pts: i64,
    fps: f64,
    width: u32,
    height: u32,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            decoder: None,
            scaler: None,
            video_stream_index: 0,
            time_base: 0.0,
            start_pts: 0,
            fps: 0.0,
            width: 0,
            height: 0,
        }
    }

    /// Maps presentation timestamps back to frame indices. The mapping is
    /// copied out so it can be used while the decoder is mutably borrowed.
    fn index_mapper(&self) -> impl Fn(i64) -> i64 {
        let (start_pts, time_base, fps) = (self.start_pts, self.time_base, self.fps);
        move |pts| ((pts - start_pts) as f64 * time_base * fps).round() as i64
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let total_frames = if stream.frames() > 0 {
            stream.frames() as usize
        } else {
            // Some containers (e.g. webm) carry no frame count; estimate from duration.
            let duration_secs = ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE);
            (duration_secs * fps).round().max(0.0) as usize
        };

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
        };

        self.video_stream_index = video_stream_index;
        self.time_base = f64::from(stream.time_base());
        self.start_pts = if stream.start_time() == ffmpeg_next::ffi::AV_NOPTS_VALUE {
            0
        } else {
            stream.start_time()
        };
        self.fps = fps;
        self.width = width;
        self.height = height;
        self.decoder = Some(decoder);
        self.scaler = Some(scaler);
        self.input_ctx = Some(ictx);

        Ok(metadata)
    }

    fn frame_at(&mut self, index: usize) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.fps <= 0.0 {
            return Err("FfmpegReader: not opened".into());
        }
        let target = index as i64;
        let seek_ts = (index as f64 / self.fps * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;

        let to_index = self.index_mapper();
        let video_stream_index = self.video_stream_index;

        let decoded = {
            let (Some(ictx), Some(decoder)) = (self.input_ctx.as_mut(), self.decoder.as_mut())
            else {
                return Err("FfmpegReader: not opened".into());
            };
            ictx.seek(seek_ts, ..seek_ts)?;
            decoder.flush();
            // Frames without a timestamp are taken as-is.
            decode_until(ictx, decoder, video_stream_index, |pts| {
                pts.map_or(true, |pts| to_index(pts) >= target)
            })
        };

        let Some(decoded) = decoded else {
            return Ok(None);
        };
        if let Some(pts) = decoded.timestamp() {
            log::trace!("frame {index} decoded at index {}", to_index(pts));
        }

        let scaler = self.scaler.as_mut().ok_or("FfmpegReader: not opened")?;
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        Ok(Some(Frame::new(pixels, self.width, self.height, 3, index)))
    }

    fn close(&mut self) {
        self.scaler = None;
        self.decoder = None;
        self.input_ctx = None;
        self.fps = 0.0;
    }
}

/// Feeds packets to the decoder until it produces a frame accepted by
/// `reached`, draining the decoder at end of stream.
///
/// Returns `None` when the stream ends first.
fn decode_until(
    ictx: &mut ffmpeg_next::format::context::Input,
    decoder: &mut ffmpeg_next::decoder::Video,
    video_stream_index: usize,
    reached: impl Fn(Option<i64>) -> bool,
) -> Option<ffmpeg_next::util::frame::video::Video> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();

    for (stream, packet) in ictx.packets() {
        if stream.index() != video_stream_index {
            continue;
        }
        if decoder.send_packet(&packet).is_err() {
            continue;
        }
        while decoder.receive_frame(&mut decoded).is_ok() {
            if reached(decoded.timestamp().or_else(|| decoded.pts())) {
                return Some(decoded);
            }
        }
    }

    let _ = decoder.send_eof();
    while decoder.receive_frame(&mut decoded).is_ok() {
        if reached(decoded.timestamp().or_else(|| decoded.pts())) {
            return Some(decoded);
        }
    }
    None
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
/// This function strips that padding to produce a tightly-packed pixel buffer.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
