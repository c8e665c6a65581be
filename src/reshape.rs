//! Parameter-driven reconstruction of decoded sample buffers.
//!
//! The native codec hands back a flat byte buffer; the parameter record
//! says how to read it. Reinterpretation is bit-pattern only, in native
//! byte order: the codec and this crate run in the same process, so no
//! endianness conversion happens (a precondition of the buffer contract,
//! not an option).

use bytemuck::Pod;
use ndarray::{ArrayD, IxDyn};

use crate::error::Error;
use crate::params::ImageParameters;

/// Decoded image samples, typed per the codec-reported precision and
/// signedness.
///
/// Shape is `[rows, columns]` for single-component images and
/// `[rows, columns, components]` otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageData {
    U8(ArrayD<u8>),
    I8(ArrayD<i8>),
    U16(ArrayD<u16>),
    I16(ArrayD<i16>),
    U32(ArrayD<u32>),
    I32(ArrayD<i32>),
}

impl ImageData {
    /// Array shape, `[rows, columns]` or `[rows, columns, components]`.
    pub fn shape(&self) -> &[usize] {
        match self {
            ImageData::U8(a) => a.shape(),
            ImageData::I8(a) => a.shape(),
            ImageData::U16(a) => a.shape(),
            ImageData::I16(a) => a.shape(),
            ImageData::U32(a) => a.shape(),
            ImageData::I32(a) => a.shape(),
        }
    }

    /// Sample width in bits: 8, 16 or 32.
    pub fn bit_width(&self) -> u32 {
        match self {
            ImageData::U8(_) | ImageData::I8(_) => 8,
            ImageData::U16(_) | ImageData::I16(_) => 16,
            ImageData::U32(_) | ImageData::I32(_) => 32,
        }
    }

    /// Whether the sample type is signed.
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            ImageData::I8(_) | ImageData::I16(_) | ImageData::I32(_)
        )
    }

    /// Total sample count.
    pub fn len(&self) -> usize {
        match self {
            ImageData::U8(a) => a.len(),
            ImageData::I8(a) => a.len(),
            ImageData::U16(a) => a.len(),
            ImageData::I16(a) => a.len(),
            ImageData::U32(a) => a.len(),
            ImageData::I32(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reinterpret a decoded byte buffer per `params` into a typed, shaped
/// array.
///
/// Pure data movement: the buffer is viewed as `ceil(precision / 8)`-byte
/// native-order samples and shaped to the image geometry. Any disagreement
/// between buffer size and reported geometry fails loudly; nothing is
/// truncated or padded.
pub fn reshape(buffer: Vec<u8>, params: &ImageParameters) -> Result<ImageData, Error> {
    params.validate()?;
    match (params.bytes_per_sample(), params.is_signed) {
        (1, false) => build(buffer, params).map(ImageData::U8),
        (1, true) => build(buffer, params).map(ImageData::I8),
        (2, false) => build(buffer, params).map(ImageData::U16),
        (2, true) => build(buffer, params).map(ImageData::I16),
        (4, false) => build(buffer, params).map(ImageData::U32),
        (4, true) => build(buffer, params).map(ImageData::I32),
        // 3-byte samples (precision 17..=24) have no machine integer type
        _ => Err(Error::UnsupportedPrecision(params.precision)),
    }
}

fn build<T: Pod>(buffer: Vec<u8>, params: &ImageParameters) -> Result<ArrayD<T>, Error> {
    let samples = typed::<T>(buffer)?;
    let elements = samples.len();
    ArrayD::from_shape_vec(IxDyn(&params.shape()), samples).map_err(|_| Error::ShapeMismatch {
        elements,
        expected: params.sample_count(),
    })
}

/// Reinterpret raw bytes as `T` samples without value conversion.
///
/// Zero-copy when the allocation already satisfies `T`'s alignment and
/// capacity; otherwise the bytes are copied verbatim into a fresh vector.
/// Either way the bit patterns are untouched.
fn typed<T: Pod>(buffer: Vec<u8>) -> Result<Vec<T>, Error> {
    let width = size_of::<T>();
    if buffer.len() % width != 0 {
        return Err(Error::BufferSizeMismatch {
            len: buffer.len(),
            bytes_per_sample: width,
        });
    }
    match bytemuck::allocation::try_cast_vec(buffer) {
        Ok(samples) => Ok(samples),
        Err((_, buffer)) => Ok(bytemuck::allocation::pod_collect_to_vec(&buffer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Colourspace;
    use ndarray::array;

    fn params(rows: u32, columns: u32, nr_components: u32, precision: u32, is_signed: bool) -> ImageParameters {
        ImageParameters {
            columns,
            rows,
            colourspace: Colourspace::Unspecified,
            nr_components,
            precision,
            is_signed,
        }
    }

    #[test]
    fn mono_u8_reshapes_row_major() {
        let image = reshape(vec![1, 2, 3, 4, 5, 6], &params(2, 3, 1, 8, false)).unwrap();
        let ImageData::U8(array) = image else {
            panic!("expected u8 samples");
        };
        assert_eq!(array, array![[1u8, 2, 3], [4, 5, 6]].into_dyn());
    }

    #[test]
    fn signed_16bit_reinterprets_native_order() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(-1i16).to_ne_bytes());
        buffer.extend_from_slice(&300i16.to_ne_bytes());

        let image = reshape(buffer, &params(1, 2, 1, 16, true)).unwrap();
        let ImageData::I16(array) = image else {
            panic!("expected i16 samples");
        };
        assert_eq!(array.shape(), &[1, 2]);
        assert_eq!(array[[0, 0]], -1);
        assert_eq!(array[[0, 1]], 300);
    }

    #[test]
    fn twelve_bit_widens_to_u16() {
        let mut buffer = Vec::new();
        for value in [0u16, 2048, 4095, 17] {
            buffer.extend_from_slice(&value.to_ne_bytes());
        }
        let image = reshape(buffer, &params(2, 2, 1, 12, false)).unwrap();
        assert_eq!(image.bit_width(), 16);
        assert!(!image.is_signed());
    }

    #[test]
    fn three_components_append_axis() {
        // 2x2 RGB, component index fastest-varying
        let buffer = vec![
            10, 20, 30, 11, 21, 31, //
            12, 22, 32, 13, 23, 33,
        ];
        let image = reshape(buffer, &params(2, 2, 3, 8, false)).unwrap();
        let ImageData::U8(array) = image else {
            panic!("expected u8 samples");
        };
        assert_eq!(array.shape(), &[2, 2, 3]);
        assert_eq!(array[[0, 0, 0]], 10);
        assert_eq!(array[[0, 1, 2]], 31);
        assert_eq!(array[[1, 1, 1]], 23);
    }

    #[test]
    fn signed_32bit_samples() {
        let mut buffer = Vec::new();
        for value in [i32::MIN, -1, 0, i32::MAX] {
            buffer.extend_from_slice(&value.to_ne_bytes());
        }
        let image = reshape(buffer, &params(2, 2, 1, 32, true)).unwrap();
        let ImageData::I32(array) = image else {
            panic!("expected i32 samples");
        };
        assert_eq!(array[[0, 0]], i32::MIN);
        assert_eq!(array[[1, 1]], i32::MAX);
    }

    #[test]
    fn odd_buffer_length_is_rejected() {
        let err = reshape(vec![0; 5], &params(1, 2, 1, 16, false)).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferSizeMismatch {
                len: 5,
                bytes_per_sample: 2
            }
        ));
    }

    #[test]
    fn short_buffer_is_rejected_not_truncated() {
        // 4 samples in the buffer, geometry wants 6
        let err = reshape(vec![0; 8], &params(2, 3, 1, 16, false)).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                elements: 4,
                expected: 6
            }
        ));
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        let err = reshape(vec![0; 12], &params(2, 3, 1, 8, false)).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                elements: 12,
                expected: 6
            }
        ));
    }

    #[test]
    fn three_byte_samples_are_unsupported() {
        let err = reshape(vec![0; 18], &params(2, 3, 1, 17, false)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPrecision(17)));
    }

    #[test]
    fn invalid_parameters_are_rejected_before_the_buffer() {
        let err = reshape(Vec::new(), &params(0, 3, 1, 8, false)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));
    }
}
