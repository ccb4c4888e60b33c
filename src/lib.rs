//! Region screen recording driven through an external FFmpeg encoder
//!
//! The core is three components composed by a thin session coordinator:
//! [`domain::RegionSelector`] turns a drag gesture into a normalized screen
//! rectangle, [`capture::CaptureSession`] owns the external capture process
//! for one recording, and [`transcode::TranscodePipeline`] re-encodes the
//! raw intermediate at a quality preset. Presentation (overlay drawing,
//! preview dialogs) lives outside this crate and consumes these operations.

pub mod app;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod ffmpeg;
pub mod session;
pub mod transcode;

#[cfg(test)]
mod test_support;
