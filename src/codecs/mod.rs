//! Codec adapters and the native-boundary contract.

#[cfg(feature = "openjpeg")]
pub mod openjpeg;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::format::J2kFormat;
use crate::params::ImageParameters;
use crate::source::EncodedSource;

/// The external codec boundary.
///
/// The only seam that crosses into native code. Implementations read the
/// source from its current position and may consume it; positioning is the
/// caller's job (the sniffer guarantees position 0 when the format was
/// auto-detected).
pub trait CodecBackend {
    /// Decode the payload to flat sample bytes.
    ///
    /// Samples are `ceil(precision / 8)` bytes each in native byte order,
    /// components interleaved per pixel, rows first.
    fn decode_to_bytes(
        &self,
        source: &mut dyn EncodedSource,
        format: J2kFormat,
    ) -> Result<Vec<u8>, Error>;

    /// Read the image parameters without decoding the pixel payload.
    fn read_parameters(
        &self,
        source: &mut dyn EncodedSource,
        format: J2kFormat,
    ) -> Result<ImageParameters, Error>;

    /// Version of the underlying codec.
    fn version(&self) -> Result<CodecVersion, Error>;
}

/// Native codec version, parsed from its dot-delimited ASCII form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CodecVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FromStr for CodecVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split('.').collect();
        if fields.len() != 3 {
            return Err(Error::InvalidVersion(s.into()));
        }
        let parse = |field: &str| {
            field
                .parse::<u32>()
                .map_err(|_| Error::InvalidVersion(s.into()))
        };
        Ok(Self {
            major: parse(fields[0])?,
            minor: parse(fields[1])?,
            patch: parse(fields[2])?,
        })
    }
}

impl fmt::Display for CodecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<CodecVersion> for (u32, u32, u32) {
    fn from(version: CodecVersion) -> Self {
        (version.major, version.minor, version.patch)
    }
}

#[cfg(feature = "openjpeg")]
pub(crate) fn default_codec(_format: J2kFormat) -> Result<openjpeg::OpenJpegCodec, Error> {
    Ok(openjpeg::OpenJpegCodec::new())
}

#[cfg(not(feature = "openjpeg"))]
pub(crate) fn default_codec(format: J2kFormat) -> Result<DisabledCodec, Error> {
    Err(Error::UnsupportedFormat(format))
}

/// Stand-in so default-codec call sites typecheck when no codec feature is
/// compiled in. Uninhabited, never constructed.
#[cfg(not(feature = "openjpeg"))]
pub(crate) enum DisabledCodec {}

#[cfg(not(feature = "openjpeg"))]
impl CodecBackend for DisabledCodec {
    fn decode_to_bytes(
        &self,
        _source: &mut dyn EncodedSource,
        _format: J2kFormat,
    ) -> Result<Vec<u8>, Error> {
        match *self {}
    }

    fn read_parameters(
        &self,
        _source: &mut dyn EncodedSource,
        _format: J2kFormat,
    ) -> Result<ImageParameters, Error> {
        match *self {}
    }

    fn version(&self) -> Result<CodecVersion, Error> {
        match *self {}
    }
}
