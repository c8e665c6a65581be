//! # zenjp2
//!
//! Thin, safe decode binding for JPEG 2000 encoded data. Format sniffing,
//! parameter extraction, and parameter-driven typed-array reconstruction
//! around the OpenJPEG native codec.
//!
//! The native codec adapter is feature-gated. Enable it when a C toolchain
//! is available:
//!
//! ```toml
//! [dependencies]
//! zenjp2 = { version = "0.1", features = ["openjpeg"] }
//! ```
//!
//! Without the feature the sniffer, parameter model, and reshaper still
//! build and run; decoding through the default codec returns
//! [`Error::UnsupportedFormat`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use zenjp2::{DecodeRequest, J2kFormat};
//!
//! // Sniff and decode
//! let data: &[u8] = &[]; // your encoded bytes
//! let image = DecodeRequest::new(data).decode()?;
//! println!("{:?}", image.shape());
//!
//! // Parameters only, with an explicit format
//! let params = zenjp2::read_parameters_format(data, J2kFormat::Jp2)?;
//! println!("{}x{}", params.rows, params.columns);
//! # Ok::<(), zenjp2::Error>(())
//! ```

#![cfg_attr(not(feature = "openjpeg"), forbid(unsafe_code))]

pub mod codecs;
mod decode;
mod error;
mod format;
mod params;
mod reshape;
mod source;

pub use codecs::{CodecBackend, CodecVersion};
#[cfg(feature = "openjpeg")]
pub use codecs::openjpeg::OpenJpegCodec;
pub use decode::DecodeRequest;
pub use error::Error;
pub use format::{J2kFormat, sniff_source};
pub use params::{
    Colourspace, ImageParameters, read_parameters, read_parameters_format, read_parameters_from,
    read_parameters_from_format, read_parameters_with,
};
pub use reshape::{ImageData, reshape};
pub use source::EncodedSource;
