use core::fmt;

/// Errors raised by the buffering primitives and DSP operators.
///
/// Size and precondition violations are synchronous and leave the failing
/// component's state untouched. Overflow is only an error for components
/// configured in strict mode; the default policy recovers locally.
#[derive(Debug, Clone, PartialEq)]
pub enum DspError {
    /// Input or destination length does not match what the component was built for.
    SizeMismatch { expected: usize, actual: usize },
    /// A constructor or method argument is out of range.
    InvalidArgument(String),
    /// A writer outpaced a reader on a component with overflow disallowed.
    Overflow,
    /// Dequeue attempted on an empty carrousel.
    Empty,
    /// An operation was called before the state it depends on exists.
    NotReady(&'static str),
    /// Requested tuner bandwidth is below the derived minimum.
    BandwidthTooLow { requested: f64, minimum: f64 },
}

impl fmt::Display for DspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DspError::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {}, got {}", expected, actual)
            }
            DspError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            DspError::Overflow => write!(f, "overflow"),
            DspError::Empty => write!(f, "carrousel is empty"),
            DspError::NotReady(what) => write!(f, "not ready: {}", what),
            DspError::BandwidthTooLow { requested, minimum } => {
                write!(f, "requested bandwidth ({}) is too low, minimum is {}", requested, minimum)
            }
        }
    }
}

impl std::error::Error for DspError {}
