//! Image decoding.

use std::io::{Cursor, SeekFrom};

use crate::codecs::{self, CodecBackend};
use crate::error::Error;
use crate::format::{J2kFormat, sniff_source};
use crate::reshape::{ImageData, reshape};
use crate::source::EncodedSource;

/// Decode request builder.
///
/// # Example
///
/// ```no_run
/// use zenjp2::DecodeRequest;
///
/// let data: &[u8] = &[]; // your encoded bytes
/// let image = DecodeRequest::new(data).decode()?;
/// println!("{:?}", image.shape());
/// # Ok::<(), zenjp2::Error>(())
/// ```
pub struct DecodeRequest<R> {
    source: R,
    format: Option<J2kFormat>,
}

impl<'a> DecodeRequest<Cursor<&'a [u8]>> {
    /// Create a decode request over an in-memory buffer.
    ///
    /// Format will be sniffed from magic bytes unless overridden.
    pub fn new(data: &'a [u8]) -> Self {
        Self::from_source(Cursor::new(data))
    }
}

impl<R: EncodedSource> DecodeRequest<R> {
    /// Create a decode request over any seekable source.
    ///
    /// The source must be positioned at the start of the encoded data.
    pub fn from_source(source: R) -> Self {
        Self {
            source,
            format: None,
        }
    }

    /// Override format sniffing.
    pub fn with_format(mut self, format: J2kFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Decode to a typed, shaped array using the default codec.
    pub fn decode(mut self) -> Result<ImageData, Error> {
        let format = self.resolve_format()?;
        let backend = codecs::default_codec(format)?;
        decode_pipeline(&backend, &mut self.source, format)
    }

    /// Decode to the flat byte form using the default codec.
    ///
    /// Skips reshaping entirely: the bytes come back exactly as the codec
    /// produced them, one unsigned byte at a time.
    pub fn decode_raw(mut self) -> Result<Vec<u8>, Error> {
        let format = self.resolve_format()?;
        let backend = codecs::default_codec(format)?;
        backend.decode_to_bytes(&mut self.source, format)
    }

    /// Decode to a typed, shaped array through a caller-supplied codec.
    pub fn decode_with<B: CodecBackend + ?Sized>(mut self, backend: &B) -> Result<ImageData, Error> {
        let format = self.resolve_format()?;
        decode_pipeline(backend, &mut self.source, format)
    }

    /// Decode to the flat byte form through a caller-supplied codec.
    pub fn decode_raw_with<B: CodecBackend + ?Sized>(mut self, backend: &B) -> Result<Vec<u8>, Error> {
        let format = self.resolve_format()?;
        backend.decode_to_bytes(&mut self.source, format)
    }

    fn resolve_format(&mut self) -> Result<J2kFormat, Error> {
        match self.format {
            Some(format) => Ok(format),
            None => sniff_source(&mut self.source),
        }
    }
}

/// One pass of the full pipeline: decode, re-read parameters, reshape.
fn decode_pipeline<B: CodecBackend + ?Sized, R: EncodedSource>(
    backend: &B,
    source: &mut R,
    format: J2kFormat,
) -> Result<ImageData, Error> {
    let buffer = backend.decode_to_bytes(source, format)?;
    // decoding consumed the source; the parameter read needs it rewound
    source.seek(SeekFrom::Start(0))?;
    let params = backend.read_parameters(source, format)?;
    params.validate()?;
    reshape(buffer, &params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_pattern() {
        let data = b"test";
        let request = DecodeRequest::new(data).with_format(J2kFormat::Jp2);
        assert_eq!(request.format, Some(J2kFormat::Jp2));
    }

    #[test]
    fn unrecognized_input_fails_before_the_codec() {
        let result = DecodeRequest::new(b"definitely not jpeg 2000").decode();
        assert!(matches!(result, Err(Error::UnrecognizedFormat)));
    }

    #[cfg(not(feature = "openjpeg"))]
    #[test]
    fn default_codec_not_compiled_in() {
        let data = [0xFF, 0x4F, 0xFF, 0x51, 0x00, 0x29];
        let result = DecodeRequest::new(&data).decode();
        assert!(matches!(
            result,
            Err(Error::UnsupportedFormat(J2kFormat::Codestream))
        ));
    }
}
