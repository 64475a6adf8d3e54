pub mod frame_sampler;
pub mod sample_frames_use_case;
pub mod sampling_plan;
