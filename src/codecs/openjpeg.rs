//! OpenJPEG codec adapter.
//!
//! Safe wrapper over `openjpeg-sys`. The encoded source is buffered into
//! memory for the duration of one call and served to the native codec
//! through stream callbacks; every native handle is released through RAII
//! guards, including on error paths. Native info/warning messages go to the
//! `log` facade, native error text is captured into the returned error.

use std::cell::RefCell;
use std::ffi::{CStr, c_char, c_void};
use std::ptr;
use std::str::FromStr;

use log::{debug, warn};
use openjpeg_sys as sys;

use crate::codecs::{CodecBackend, CodecVersion};
use crate::error::Error;
use crate::format::J2kFormat;
use crate::params::{Colourspace, ImageParameters};
use crate::source::{EncodedSource, read_all};

/// Chunk size for the native stream's internal buffer.
const STREAM_CHUNK: usize = 0x100_000;

impl From<J2kFormat> for sys::CODEC_FORMAT {
    fn from(format: J2kFormat) -> Self {
        match format {
            J2kFormat::Codestream => sys::CODEC_FORMAT::OPJ_CODEC_J2K,
            J2kFormat::Jpt => sys::CODEC_FORMAT::OPJ_CODEC_JPT,
            J2kFormat::Jp2 => sys::CODEC_FORMAT::OPJ_CODEC_JP2,
        }
    }
}

impl From<sys::COLOR_SPACE> for Colourspace {
    fn from(space: sys::COLOR_SPACE) -> Self {
        use sys::COLOR_SPACE::*;
        match space {
            OPJ_CLRSPC_UNKNOWN => Colourspace::Unknown,
            OPJ_CLRSPC_UNSPECIFIED => Colourspace::Unspecified,
            OPJ_CLRSPC_SRGB => Colourspace::Srgb,
            OPJ_CLRSPC_GRAY => Colourspace::Monochrome,
            OPJ_CLRSPC_SYCC => Colourspace::Yuv,
            OPJ_CLRSPC_EYCC => Colourspace::EYcc,
            OPJ_CLRSPC_CMYK => Colourspace::Cmyk,
        }
    }
}

/// Decoder backed by the OpenJPEG native library.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenJpegCodec;

impl OpenJpegCodec {
    pub fn new() -> Self {
        Self
    }
}

impl CodecBackend for OpenJpegCodec {
    fn decode_to_bytes(
        &self,
        source: &mut dyn EncodedSource,
        format: J2kFormat,
    ) -> Result<Vec<u8>, Error> {
        let data = read_all(source)?;
        decode_impl(data, format).map_err(|detail| Error::DecodeFailed { format, detail })
    }

    fn read_parameters(
        &self,
        source: &mut dyn EncodedSource,
        format: J2kFormat,
    ) -> Result<ImageParameters, Error> {
        let data = read_all(source)?;
        parameters_impl(data, format)
            .map_err(|detail| Error::ParameterReadFailed { format, detail })
    }

    fn version(&self) -> Result<CodecVersion, Error> {
        let raw = unsafe { CStr::from_ptr(sys::opj_version()) };
        let text = raw
            .to_str()
            .map_err(|_| Error::InvalidVersion("<non-ascii>".into()))?;
        CodecVersion::from_str(text)
    }
}

fn parameters_impl(data: Vec<u8>, format: J2kFormat) -> Result<ImageParameters, String> {
    let (_codec, _stream, image) = read_header(data, format)?;
    parameters_from_image(&image)
}

fn decode_impl(data: Vec<u8>, format: J2kFormat) -> Result<Vec<u8>, String> {
    let (codec, stream, image) = read_header(data, format)?;
    if unsafe { sys::opj_decode(codec.codec, stream.stream, image.image) } == 0 {
        return Err(codec.failure("decoding failed"));
    }
    if unsafe { sys::opj_end_decompress(codec.codec, stream.stream) } == 0 {
        return Err(codec.failure("decoding failed at end of codestream"));
    }
    let params = parameters_from_image(&image)?;
    debug!(
        "decoded {}x{}x{} at {} bit",
        params.rows, params.columns, params.nr_components, params.precision
    );
    pack_samples(&image, &params)
}

/// Create the decompressor and stream, then read the codestream header.
fn read_header(
    data: Vec<u8>,
    format: J2kFormat,
) -> Result<(Decompressor, DecodeStream, DecodedImage), String> {
    let codec = Decompressor::new(format)?;
    let stream = DecodeStream::new(data)?;
    let mut image: *mut sys::opj_image_t = ptr::null_mut();
    let ok = unsafe { sys::opj_read_header(stream.stream, codec.codec, &mut image) };
    if ok == 0 || image.is_null() {
        return Err(codec.failure("failed to read codestream header"));
    }
    Ok((codec, stream, DecodedImage { image }))
}

fn parameters_from_image(image: &DecodedImage) -> Result<ImageParameters, String> {
    let comps = image.components();
    let first = comps.first().ok_or("image has no components")?;
    if comps
        .iter()
        .any(|c| c.w != first.w || c.h != first.h || c.prec != first.prec || c.sgnd != first.sgnd)
    {
        return Err("components with mismatched geometry or precision are not supported".into());
    }
    Ok(ImageParameters {
        columns: first.w,
        rows: first.h,
        colourspace: image.color_space().into(),
        nr_components: comps.len() as u32,
        precision: first.prec,
        is_signed: first.sgnd != 0,
    })
}

/// Interleave the component planes into flat per-pixel samples,
/// `ceil(precision / 8)` bytes each, native byte order.
fn pack_samples(image: &DecodedImage, params: &ImageParameters) -> Result<Vec<u8>, String> {
    let comps = image.components();
    let pixels = params.rows as usize * params.columns as usize;
    let width = params.bytes_per_sample();

    let mut planes = Vec::with_capacity(comps.len());
    for (index, comp) in comps.iter().enumerate() {
        if comp.data.is_null() {
            return Err(format!("component {index} has no sample data"));
        }
        planes.push(unsafe { std::slice::from_raw_parts(comp.data, pixels) });
    }

    let mut out = Vec::with_capacity(pixels * planes.len() * width);
    for pixel in 0..pixels {
        for plane in &planes {
            let sample = plane[pixel];
            match width {
                1 => out.push(sample as u8),
                2 => out.extend_from_slice(&(sample as u16).to_ne_bytes()),
                3 => {
                    let bytes = sample.to_ne_bytes();
                    if cfg!(target_endian = "little") {
                        out.extend_from_slice(&bytes[..3]);
                    } else {
                        out.extend_from_slice(&bytes[1..]);
                    }
                }
                _ => out.extend_from_slice(&(sample as u32).to_ne_bytes()),
            }
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Native handle guards
// ---------------------------------------------------------------------------

/// Sink for native error text, written by the error handler callback.
struct MessageSink {
    last: RefCell<String>,
}

struct Decompressor {
    codec: *mut sys::opj_codec_t,
    sink: Box<MessageSink>,
}

impl Decompressor {
    fn new(format: J2kFormat) -> Result<Self, String> {
        let codec = unsafe { sys::opj_create_decompress(format.into()) };
        if codec.is_null() {
            return Err("failed to create decompressor".into());
        }
        let sink = Box::new(MessageSink {
            last: RefCell::new(String::new()),
        });
        unsafe {
            let client = &*sink as *const MessageSink as *mut c_void;
            sys::opj_set_error_handler(codec, Some(on_error), client);
            sys::opj_set_warning_handler(codec, Some(on_warning), ptr::null_mut());
            sys::opj_set_info_handler(codec, Some(on_info), ptr::null_mut());

            let mut params: sys::opj_dparameters_t = std::mem::zeroed();
            sys::opj_set_default_decoder_parameters(&mut params);
            if sys::opj_setup_decoder(codec, &mut params) == 0 {
                sys::opj_destroy_codec(codec);
                return Err("failed to set up decoder".into());
            }
        }
        Ok(Self { codec, sink })
    }

    /// Last native error message, or `fallback` when the codec said nothing.
    fn failure(&self, fallback: &str) -> String {
        let last = self.sink.last.borrow();
        if last.is_empty() {
            fallback.to_string()
        } else {
            last.clone()
        }
    }
}

impl Drop for Decompressor {
    fn drop(&mut self) {
        unsafe { sys::opj_destroy_codec(self.codec) };
    }
}

unsafe extern "C" fn on_error(msg: *const c_char, client: *mut c_void) {
    let sink = unsafe { &*(client as *const MessageSink) };
    if let Ok(text) = unsafe { CStr::from_ptr(msg) }.to_str() {
        *sink.last.borrow_mut() = text.trim_end().to_string();
    }
}

unsafe extern "C" fn on_warning(msg: *const c_char, _client: *mut c_void) {
    if let Ok(text) = unsafe { CStr::from_ptr(msg) }.to_str() {
        warn!("openjpeg: {}", text.trim_end());
    }
}

unsafe extern "C" fn on_info(msg: *const c_char, _client: *mut c_void) {
    if let Ok(text) = unsafe { CStr::from_ptr(msg) }.to_str() {
        debug!("openjpeg: {}", text.trim_end());
    }
}

/// Decoded image handle.
struct DecodedImage {
    image: *mut sys::opj_image_t,
}

impl DecodedImage {
    fn components(&self) -> &[sys::opj_image_comp_t] {
        unsafe {
            let image = &*self.image;
            if image.comps.is_null() || image.numcomps == 0 {
                return &[];
            }
            std::slice::from_raw_parts(image.comps, image.numcomps as usize)
        }
    }

    fn color_space(&self) -> sys::COLOR_SPACE {
        unsafe { (*self.image).color_space }
    }
}

impl Drop for DecodedImage {
    fn drop(&mut self) {
        unsafe { sys::opj_image_destroy(self.image) };
    }
}

// ---------------------------------------------------------------------------
// Memory-backed native stream
// ---------------------------------------------------------------------------

struct StreamData {
    data: Vec<u8>,
    offset: usize,
}

/// Input stream handed to the native codec through callbacks.
struct DecodeStream {
    stream: *mut sys::opj_stream_t,
}

impl DecodeStream {
    fn new(data: Vec<u8>) -> Result<Self, String> {
        let len = data.len();
        let user = Box::into_raw(Box::new(StreamData { data, offset: 0 }));
        let stream = unsafe { sys::opj_stream_create(STREAM_CHUNK, 1) };
        if stream.is_null() {
            // stream creation failed before taking ownership of the data
            drop(unsafe { Box::from_raw(user) });
            return Err("failed to create codec stream".into());
        }
        unsafe {
            sys::opj_stream_set_read_function(stream, Some(buf_read));
            sys::opj_stream_set_skip_function(stream, Some(buf_skip));
            sys::opj_stream_set_seek_function(stream, Some(buf_seek));
            sys::opj_stream_set_user_data(stream, user as *mut c_void, Some(buf_free));
            sys::opj_stream_set_user_data_length(stream, len as u64);
        }
        Ok(Self { stream })
    }
}

impl Drop for DecodeStream {
    fn drop(&mut self) {
        // also frees the StreamData through the registered callback
        unsafe { sys::opj_stream_destroy(self.stream) };
    }
}

unsafe extern "C" fn buf_read(buffer: *mut c_void, count: usize, user: *mut c_void) -> usize {
    let data = unsafe { &mut *(user as *mut StreamData) };
    let remaining = data.data.len().saturating_sub(data.offset);
    if remaining == 0 || count == 0 {
        return usize::MAX; // EOF marker expected by the codec
    }
    let step = remaining.min(count);
    unsafe {
        ptr::copy_nonoverlapping(data.data.as_ptr().add(data.offset), buffer as *mut u8, step);
    }
    data.offset += step;
    step
}

unsafe extern "C" fn buf_skip(count: i64, user: *mut c_void) -> i64 {
    let data = unsafe { &mut *(user as *mut StreamData) };
    if count < 0 {
        return -1;
    }
    data.offset = data.offset.saturating_add(count as usize).min(data.data.len());
    count
}

unsafe extern "C" fn buf_seek(position: i64, user: *mut c_void) -> i32 {
    let data = unsafe { &mut *(user as *mut StreamData) };
    if position < 0 || position as usize > data.data.len() {
        return 0;
    }
    data.offset = position as usize;
    1
}

unsafe extern "C" fn buf_free(user: *mut c_void) {
    drop(unsafe { Box::from_raw(user as *mut StreamData) });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn native_version_parses() {
        let version = OpenJpegCodec::new().version().unwrap();
        assert!(version.major >= 2);
    }

    #[test]
    fn empty_source_fails_with_native_detail() {
        let mut source = Cursor::new(Vec::<u8>::new());
        let err = OpenJpegCodec::new()
            .read_parameters(&mut source, J2kFormat::Jp2)
            .unwrap_err();
        assert!(matches!(err, Error::ParameterReadFailed { .. }));
    }

    #[test]
    fn truncated_codestream_fails() {
        let mut source = Cursor::new(vec![0xFF, 0x4F, 0xFF, 0x51, 0x00, 0x29]);
        let err = OpenJpegCodec::new()
            .decode_to_bytes(&mut source, J2kFormat::Codestream)
            .unwrap_err();
        assert!(matches!(err, Error::DecodeFailed { .. }));
    }
}
