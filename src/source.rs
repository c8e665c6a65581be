//! Stream normalization for encoded input.
//!
//! Callers hand over either a raw byte buffer or any seekable reader. The
//! capability set a source must provide (read, seek, tell) is the trait
//! bound below, so an unsuitable source is rejected at compile time; a
//! source that fails at runtime surfaces as [`Error::Io`].

use std::io::{Read, Seek, SeekFrom};

use crate::error::Error;

/// A seekable, readable source of encoded JPEG 2000 bytes.
///
/// Blanket-implemented for every `Read + Seek` type. In-memory buffers are
/// wrapped in a [`std::io::Cursor`] by the entry points that accept
/// `&[u8]`, so a raw buffer and a file handle go through the same pipeline.
pub trait EncodedSource: Read + Seek {}

impl<R: Read + Seek> EncodedSource for R {}

/// Read up to `n` leading bytes, then restore the position to the start.
///
/// The rewind happens before the bytes are handed back: downstream callers
/// depend on the source reaching the decoder unconsumed.
pub(crate) fn peek_prefix<R: EncodedSource + ?Sized>(
    source: &mut R,
    n: usize,
) -> Result<Vec<u8>, Error> {
    let mut prefix = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        let read = source.read(&mut prefix[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    prefix.truncate(filled);
    source.seek(SeekFrom::Start(0))?;
    Ok(prefix)
}

/// Drain the source into memory from its current position.
///
/// Positioning is the caller's job: auto-detected formats arrive here at
/// position 0 via the sniffer contract, explicit-format callers must seek
/// themselves.
#[cfg(feature = "openjpeg")]
pub(crate) fn read_all<R: EncodedSource + ?Sized>(source: &mut R) -> Result<Vec<u8>, Error> {
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn peek_restores_position() {
        let mut source = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let prefix = peek_prefix(&mut source, 3).unwrap();
        assert_eq!(prefix, [1, 2, 3]);
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn peek_short_source() {
        let mut source = Cursor::new(vec![7u8, 8]);
        let prefix = peek_prefix(&mut source, 20).unwrap();
        assert_eq!(prefix, [7, 8]);
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn peek_empty_source() {
        let mut source = Cursor::new(Vec::<u8>::new());
        let prefix = peek_prefix(&mut source, 20).unwrap();
        assert!(prefix.is_empty());
    }
}
