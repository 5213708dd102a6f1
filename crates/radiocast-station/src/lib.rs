//! Receiver runtime for Radiocast
//!
//! Wires the radio front-end to the DSP engine: a device thread reading the
//! SDR into a sample ring, a DSP thread channelizing and demodulating
//! one-second windows, and the audio/recording/publishing sinks.

pub mod audio;
pub mod error;
pub mod publisher;
pub mod recorder;
pub mod soapyio;
pub mod station;

pub use error::StationError;
pub use publisher::{Publisher, Subscriber};
pub use recorder::Recorder;
pub use station::run_station;
