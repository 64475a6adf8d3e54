pub mod deduplicate_frames_use_case;
pub mod domain;
pub mod infrastructure;
