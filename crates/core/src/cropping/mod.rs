pub mod crop_frames_use_case;
pub mod domain;
pub mod infrastructure;
