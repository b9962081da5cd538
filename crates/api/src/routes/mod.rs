//! HTTP Routes

pub mod samples;
pub mod sessions;
