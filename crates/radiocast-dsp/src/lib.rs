//! Signal processing engine for Radiocast
//!
//! Filter design and application kernels, FFT kernels, the per-block DSP
//! operators, the FM demodulator family and the frequency-domain
//! channelizer. Operators carry continuity state between blocks and are
//! owned by exactly one thread; constructing a fresh instance is the reset
//! mechanism.

pub mod bandpass;
pub mod decimate;
pub mod deemphasis;
pub mod demodulator;
pub mod festimator;
pub mod fft;
pub mod filter;
pub mod fm;
pub mod mfm;
pub mod pll;
pub mod resample;
pub mod tuner;
pub mod wbfm;

// Re-export commonly used items
pub use bandpass::Bandpass;
pub use decimate::Decimate;
pub use deemphasis::Deemphasis;
pub use demodulator::{build_demodulator, Demodulator};
pub use festimator::FreqEstimator;
pub use fm::Fm;
pub use mfm::Mfm;
pub use pll::Pll;
pub use resample::Resample;
pub use tuner::{Channel, Tuner};
pub use wbfm::Wbfm;
