pub mod composition;
pub mod cropping;
pub mod dedup;
pub mod pipeline;
pub mod sampling;
pub mod shared;
pub mod video;
