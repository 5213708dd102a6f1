use core::fmt;

use radiocast_core::DspError;

/// Errors raised while building or running a station.
#[derive(Debug)]
pub enum StationError {
    Config(String),
    Dsp(DspError),
    Device(soapysdr::Error),
    Audio(String),
    Io(std::io::Error),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Config(msg) => write!(f, "configuration error: {}", msg),
            StationError::Dsp(err) => write!(f, "dsp error: {}", err),
            StationError::Device(err) => write!(f, "device error: {}", err),
            StationError::Audio(msg) => write!(f, "audio error: {}", msg),
            StationError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for StationError {}

impl From<DspError> for StationError {
    fn from(err: DspError) -> Self {
        StationError::Dsp(err)
    }
}

impl From<soapysdr::Error> for StationError {
    fn from(err: soapysdr::Error) -> Self {
        StationError::Device(err)
    }
}

impl From<std::io::Error> for StationError {
    fn from(err: std::io::Error) -> Self {
        StationError::Io(err)
    }
}
