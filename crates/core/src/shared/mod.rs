pub mod constants;
pub mod crop_band;
pub mod error;
pub mod frame;
pub mod trim_range;
pub mod video_metadata;
