//! Image parameter records reported by the native codec.

use std::io::Cursor;

use crate::codecs::{self, CodecBackend};
use crate::error::Error;
use crate::format::{J2kFormat, sniff_source};
use crate::source::EncodedSource;

/// Colour space signalled by the codestream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Colourspace {
    Unknown,
    Unspecified,
    Srgb,
    Monochrome,
    Yuv,
    EYcc,
    Cmyk,
}

impl Colourspace {
    /// Human-readable name, matching the strings the codec documents.
    pub const fn name(self) -> &'static str {
        match self {
            Colourspace::Unknown => "unknown",
            Colourspace::Unspecified => "unspecified",
            Colourspace::Srgb => "sRGB",
            Colourspace::Monochrome => "monochrome",
            Colourspace::Yuv => "YUV",
            Colourspace::EYcc => "e-YCC",
            Colourspace::Cmyk => "CYMK",
        }
    }
}

/// Image geometry and sample description reported by the codec.
///
/// Produced once per call by the codec boundary and never mutated after;
/// the reshaper reads it to pick the element type and array shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageParameters {
    /// Image width in samples.
    pub columns: u32,
    /// Image height in samples.
    pub rows: u32,
    pub colourspace: Colourspace,
    /// Component (band) count; 1 for monochrome, 3 for colour.
    pub nr_components: u32,
    /// Sample precision in bits, 1..=32.
    pub precision: u32,
    /// Whether samples are two's-complement signed.
    pub is_signed: bool,
}

impl ImageParameters {
    /// Check the invariants the reshaper depends on.
    pub fn validate(&self) -> Result<(), Error> {
        if self.columns == 0 || self.rows == 0 {
            return Err(Error::InvalidParameters(format!(
                "image geometry is {}x{}",
                self.rows, self.columns
            )));
        }
        if self.nr_components == 0 {
            return Err(Error::InvalidParameters("image has no components".into()));
        }
        if !(1..=32).contains(&self.precision) {
            return Err(Error::InvalidParameters(format!(
                "precision {} out of range 1..=32",
                self.precision
            )));
        }
        Ok(())
    }

    /// Bytes per decoded sample: `ceil(precision / 8)`.
    pub const fn bytes_per_sample(&self) -> usize {
        self.precision.div_ceil(8) as usize
    }

    /// Total sample count, `rows * columns * nr_components`.
    pub const fn sample_count(&self) -> usize {
        self.rows as usize * self.columns as usize * self.nr_components as usize
    }

    /// Array shape: `[rows, columns]`, plus a trailing component axis when
    /// there is more than one component.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = vec![self.rows as usize, self.columns as usize];
        if self.nr_components > 1 {
            shape.push(self.nr_components as usize);
        }
        shape
    }
}

/// Read image parameters from an in-memory buffer, sniffing the format.
pub fn read_parameters(data: &[u8]) -> Result<ImageParameters, Error> {
    let mut source = Cursor::new(data);
    let format = sniff_source(&mut source)?;
    let backend = codecs::default_codec(format)?;
    read_parameters_with(&backend, &mut source, Some(format))
}

/// Read image parameters from an in-memory buffer with a known format.
pub fn read_parameters_format(data: &[u8], format: J2kFormat) -> Result<ImageParameters, Error> {
    let backend = codecs::default_codec(format)?;
    read_parameters_with(&backend, &mut Cursor::new(data), Some(format))
}

/// Read image parameters from a seekable source, sniffing the format.
///
/// Sniffing restores the source to the start, so the codec sees the whole
/// encoded stream.
pub fn read_parameters_from<R: EncodedSource>(source: &mut R) -> Result<ImageParameters, Error> {
    let format = sniff_source(source)?;
    let backend = codecs::default_codec(format)?;
    read_parameters_with(&backend, source, Some(format))
}

/// Read image parameters from a seekable source with a known format.
///
/// The source must already be positioned at the start of the encoded data.
pub fn read_parameters_from_format<R: EncodedSource>(
    source: &mut R,
    format: J2kFormat,
) -> Result<ImageParameters, Error> {
    let backend = codecs::default_codec(format)?;
    read_parameters_with(&backend, source, Some(format))
}

/// Read image parameters through a caller-supplied codec.
///
/// With `format` of `None` the format is sniffed first. The returned record
/// is checked against its invariants before being handed back.
pub fn read_parameters_with<B: CodecBackend + ?Sized, R: EncodedSource>(
    backend: &B,
    source: &mut R,
    format: Option<J2kFormat>,
) -> Result<ImageParameters, Error> {
    let format = match format {
        Some(format) => format,
        None => sniff_source(source)?,
    };
    let params = backend.read_parameters(source, format)?;
    params.validate()?;
    Ok(params)
}
