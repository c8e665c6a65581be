//! JPEG 2000 container format detection.

use log::debug;

use crate::error::Error;
use crate::source::{EncodedSource, peek_prefix};

/// Number of leading bytes examined by [`sniff_source`].
const SNIFF_LEN: usize = 20;

/// Known signatures, checked in order, shorter prefixes first. The entries
/// are disjoint, so first-match-wins matters only for reading the table.
const SIGNATURES: &[(&[u8], J2kFormat)] = &[
    // Raw codestream, no container framing (.j2k, .jpc, .j2c)
    (b"\xff\x4f\xff\x51", J2kFormat::Codestream),
    // JP2, bare signature box and full RFC 3745 form (.jp2)
    (b"\x0d\x0a\x87\x0a", J2kFormat::Jp2),
    (
        b"\x00\x00\x00\x0c\x6a\x50\x20\x20\x0d\x0a\x87\x0a",
        J2kFormat::Jp2,
    ),
];

/// JPEG 2000 container framings.
///
/// The integer codes are a stable part of the public contract and select
/// the matching decoder in the native codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum J2kFormat {
    /// Raw codestream without container framing, e.g. DICOM pixel data.
    Codestream = 0,
    /// JPT-stream (JPIP). Has no magic signature; reachable only through
    /// an explicit format or a file extension.
    Jpt = 1,
    /// JP2 boxed file format.
    Jp2 = 2,
}

impl J2kFormat {
    /// Stable integer code: `0` codestream, `1` JPT, `2` JP2.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`code`](Self::code). Returns `None` for unknown codes.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(J2kFormat::Codestream),
            1 => Some(J2kFormat::Jpt),
            2 => Some(J2kFormat::Jp2),
            _ => None,
        }
    }

    /// Detect format from magic bytes. Returns `None` if unrecognized.
    ///
    /// Matches the leading bytes against the signature table, 4-byte
    /// prefixes before the 12-byte RFC 3745 prefix.
    pub fn detect(data: &[u8]) -> Option<Self> {
        SIGNATURES
            .iter()
            .find(|(signature, _)| data.len() >= signature.len() && &data[..signature.len()] == *signature)
            .map(|&(_, format)| format)
    }

    /// Detect format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "j2k" | "j2c" | "jpc" => Some(J2kFormat::Codestream),
            "jpt" => Some(J2kFormat::Jpt),
            "jp2" => Some(J2kFormat::Jp2),
            _ => None,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            J2kFormat::Codestream => "raw codestream",
            J2kFormat::Jpt => "JPT-stream",
            J2kFormat::Jp2 => "JP2",
        }
    }

    /// Common file extensions.
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            J2kFormat::Codestream => &["j2k", "j2c", "jpc"],
            J2kFormat::Jpt => &["jpt"],
            J2kFormat::Jp2 => &["jp2"],
        }
    }
}

/// Sniff the format from the first bytes of `source`.
///
/// Reads at most 20 bytes and always restores the position to the start
/// before returning, so the source reaches the decoder unconsumed whether
/// or not a signature matched.
pub fn sniff_source<R: EncodedSource + ?Sized>(source: &mut R) -> Result<J2kFormat, Error> {
    let prefix = peek_prefix(source, SNIFF_LEN)?;
    match J2kFormat::detect(&prefix) {
        Some(format) => {
            debug!("sniffed {} from a {}-byte prefix", format.name(), prefix.len());
            Ok(format)
        }
        None => Err(Error::UnrecognizedFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn detect_codestream() {
        let data = [0xFF, 0x4F, 0xFF, 0x51, 0x00, 0x29];
        assert_eq!(J2kFormat::detect(&data), Some(J2kFormat::Codestream));
    }

    #[test]
    fn detect_jp2_bare_signature() {
        let data = [0x0D, 0x0A, 0x87, 0x0A, 0x00, 0x00];
        assert_eq!(J2kFormat::detect(&data), Some(J2kFormat::Jp2));
    }

    #[test]
    fn detect_jp2_rfc3745() {
        let data = [
            0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A, 0x00, 0x00,
        ];
        assert_eq!(J2kFormat::detect(&data), Some(J2kFormat::Jp2));
    }

    #[test]
    fn detect_rfc3745_prefix_alone_is_not_enough() {
        // First 8 bytes of the RFC 3745 signature, then garbage
        let data = [0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0xAA, 0xBB, 0xCC, 0xDD];
        assert_eq!(J2kFormat::detect(&data), None);
    }

    #[test]
    fn detect_unrecognized() {
        let data = b"not jpeg 2000 at all";
        assert_eq!(J2kFormat::detect(data), None);
    }

    #[test]
    fn detect_too_short() {
        let data = [0xFF, 0x4F];
        assert_eq!(J2kFormat::detect(&data), None);
    }

    #[test]
    fn code_round_trips() {
        for format in [J2kFormat::Codestream, J2kFormat::Jpt, J2kFormat::Jp2] {
            assert_eq!(J2kFormat::from_code(format.code()), Some(format));
        }
        assert_eq!(J2kFormat::from_code(3), None);
        assert_eq!(J2kFormat::Codestream.code(), 0);
        assert_eq!(J2kFormat::Jpt.code(), 1);
        assert_eq!(J2kFormat::Jp2.code(), 2);
    }

    #[test]
    fn from_extension_case_insensitive() {
        assert_eq!(J2kFormat::from_extension("JP2"), Some(J2kFormat::Jp2));
        assert_eq!(J2kFormat::from_extension("j2c"), Some(J2kFormat::Codestream));
        assert_eq!(J2kFormat::from_extension("Jpt"), Some(J2kFormat::Jpt));
        assert_eq!(J2kFormat::from_extension("png"), None);
    }

    #[test]
    fn sniff_leaves_position_at_start() {
        let mut data = vec![0xFF, 0x4F, 0xFF, 0x51];
        data.extend_from_slice(&[0u8; 32]);
        let mut source = Cursor::new(data);

        let format = sniff_source(&mut source).unwrap();
        assert_eq!(format, J2kFormat::Codestream);
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn sniff_unrecognized_restores_position() {
        let mut source = Cursor::new(vec![0u8; 64]);
        let err = sniff_source(&mut source).unwrap_err();
        assert!(matches!(err, Error::UnrecognizedFormat));
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn sniff_short_source() {
        // Fewer than 20 bytes available is fine as long as a signature fits
        let mut source = Cursor::new(vec![0x0D, 0x0A, 0x87, 0x0A]);
        assert_eq!(sniff_source(&mut source).unwrap(), J2kFormat::Jp2);
    }
}
