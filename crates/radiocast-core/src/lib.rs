//! Core utilities for Radiocast
//!
//! This crate provides the fundamental types shared across the receiver
//! stack: sample type aliases, the buffering primitives that carry samples
//! between threads, the error taxonomy and logging setup.

/// Git version string, set at compile time
pub const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");
/// Stack version followed by git version string, e.g., "0.3.1-aabbccdd"
pub const STACK_VERSION: &str = const_format::formatcp!("{}-{}", env!("CARGO_PKG_VERSION"), GIT_VERSION);

pub mod buffer;
pub mod carrousel;
pub mod chopper;
pub mod debug;
pub mod dsp_error;
pub mod ringbuffer;
pub mod sample_types;

// Re-export commonly used items
pub use buffer::Buffer;
pub use carrousel::Carrousel;
pub use chopper::Chopper;
pub use dsp_error::DspError;
pub use ringbuffer::SampleRing;
pub use sample_types::*;
