//! Unified error type for decode and parameter operations.

use thiserror::Error as ThisError;

use crate::format::J2kFormat;

/// Unified error type for decode and parameter operations.
///
/// Every failure surfaces here; nothing is logged-and-swallowed, and no
/// partial results are returned alongside an error.
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum Error {
    /// No known signature matched during format sniffing.
    #[error("no matching JPEG 2000 format found")]
    UnrecognizedFormat,

    /// Format recognized but no codec adapter is compiled in.
    #[error("format {0:?} not supported (codec not compiled in)")]
    UnsupportedFormat(J2kFormat),

    /// The native codec rejected the stream while decoding.
    #[error("decoding failed ({format:?}): {detail}")]
    DecodeFailed {
        format: J2kFormat,
        /// Native error text, attached verbatim.
        detail: String,
    },

    /// The native codec rejected the stream while reading the header.
    #[error("reading parameters failed ({format:?}): {detail}")]
    ParameterReadFailed {
        format: J2kFormat,
        /// Native error text, attached verbatim.
        detail: String,
    },

    /// Decoded buffer length is not a whole number of samples.
    #[error("buffer of {len} bytes is not a whole number of {bytes_per_sample}-byte samples")]
    BufferSizeMismatch { len: usize, bytes_per_sample: usize },

    /// Decoded sample count disagrees with the codec-reported geometry.
    #[error("{elements} samples do not fill a {expected}-sample image")]
    ShapeMismatch { elements: usize, expected: usize },

    /// Precision maps to 3-byte samples, which have no machine integer type.
    #[error("precision {0} needs 3-byte samples, which have no native integer type")]
    UnsupportedPrecision(u32),

    /// Parameter record violates its invariants.
    #[error("invalid image parameters: {0}")]
    InvalidParameters(String),

    /// Codec version string did not parse as a dotted triplet.
    #[error("invalid codec version string {0:?}")]
    InvalidVersion(String),

    /// The source stream failed to read or seek.
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
}
