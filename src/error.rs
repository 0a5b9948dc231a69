use core::fmt;

/// Errors raised while decoding a reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The first byte is not the response marker.
    BadMarker,
    /// The frame is not `4 + expected payload length` bytes long.
    LengthMismatch,
    /// The trailing byte is not the XOR of every byte before it.
    ChecksumMismatch,
    /// The expected payload does not fit the reply buffer.
    PayloadTooLarge,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::BadMarker => f.write_str("reply does not start with the response marker"),
            FrameError::LengthMismatch => f.write_str("reply length does not match the command"),
            FrameError::ChecksumMismatch => f.write_str("reply checksum mismatch"),
            FrameError::PayloadTooLarge => f.write_str("reply payload exceeds buffer capacity"),
        }
    }
}

/// A payload of the wrong arity for its opcode, or an address outside `1..=127`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidArgument;

/// Errors returned by the driver, generic over the bus error type `E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// The bus transport failed.
    Bus(E),
    /// The reply did not form a valid frame.
    Frame(FrameError),
    /// Rejected before any bus I/O took place.
    InvalidArgument,
    /// The interrupt line could not be sampled.
    InterruptLine,
}

impl<E> From<FrameError> for Error<E> {
    fn from(e: FrameError) -> Self {
        Error::Frame(e)
    }
}

impl<E> From<InvalidArgument> for Error<E> {
    fn from(_: InvalidArgument) -> Self {
        Error::InvalidArgument
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus error: {:?}", e),
            Error::Frame(e) => write!(f, "frame error: {}", e),
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::InterruptLine => f.write_str("failed to read interrupt line"),
        }
    }
}
