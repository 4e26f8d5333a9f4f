//! Detection of the codec actually applied to response bytes.
//!
//! Gzip is recognized by its magic number, brotli by trial decoding, and
//! Zopfli by the header it writes. Only gzip detection is exact.

use compression_codecs::{DecodeV2, brotli::BrotliDecoder, deflate::DeflateDecoder, gzip::GzipDecoder};
use compression_core::util::{PartialBuffer, WriteBuffer};
use std::fmt;
use std::io;

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024; // 8KB output buffer

/// Upper bound on nested codings undone by [`decode_body`].
const MAX_CODING_LAYERS: usize = 4;

/// RFC 1952 member header magic number.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Header Zopfli writes: no flags, MTIME 0, XFL 2 (max compression), OS 3 (Unix).
const ZOPFLI_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03];

/// Compression codecs that can be verified from response bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Gzip compression (including Zopfli output).
    Gzip,
    /// Brotli compression.
    Brotli,
}

impl Codec {
    /// Returns the Content-Encoding header value for this codec.
    pub fn content_encoding(&self) -> &'static str {
        match self {
            Codec::Gzip => "gzip",
            Codec::Brotli => "br",
        }
    }

    /// Detects the codec applied to `bytes`, checking gzip first.
    pub fn detect(bytes: &[u8]) -> Option<Codec> {
        if is_gzip(bytes) {
            Some(Codec::Gzip)
        } else if is_brotli(bytes) {
            Some(Codec::Brotli)
        } else {
            None
        }
    }

    fn decoder(&self) -> Box<dyn DecodeV2> {
        match self {
            Codec::Gzip => Box::new(GzipDecoder::new()),
            Codec::Brotli => Box::new(BrotliDecoder::new()),
        }
    }
}

/// Encoder family named in diagnostics.
///
/// Zopfli is not a separate wire codec, only a gzip encoder with a better
/// ratio, but servers are expected to use it when `require_zopfli` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressor {
    /// Plain gzip.
    Gzip,
    /// Gzip produced by Zopfli.
    Zopfli,
    /// Brotli.
    Brotli,
}

impl Compressor {
    /// Picks the gzip family name for gzip `bytes`.
    pub fn gzip_family(bytes: &[u8]) -> Self {
        if is_suspected_zopfli(bytes) {
            Compressor::Gzip
        } else {
            Compressor::Zopfli
        }
    }
}

impl fmt::Display for Compressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compressor::Gzip => "gzip",
            Compressor::Zopfli => "Zopfli",
            Compressor::Brotli => "Brotli",
        })
    }
}

/// Returns `true` if `bytes` start with the gzip magic number.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Returns `true` if `bytes` decode as a complete brotli stream.
///
/// Brotli has no magic number, so this runs a trial decompression. A decode
/// error means "not brotli". A stream that decodes to nothing, or that ends
/// before the input does, is rejected as incidentally decodable garbage.
///
/// This is a heuristic: short inputs can still decode by accident (false
/// positive), and a truncated brotli body is reported as not brotli (false
/// negative).
pub fn is_brotli(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }

    // One byte of output proves the stream produces something
    let mut decoder = BrotliDecoder::new();
    match decode_all(&mut decoder, bytes, 1) {
        Ok(decoded) => decoded.consumed == bytes.len() && !decoded.data.is_empty(),
        Err(_) => false,
    }
}

/// Returns `true` unless `bytes` start with the header Zopfli produces.
///
/// Note the inversion: this answers "does not look like Zopfli". A missing
/// header pattern reliably means the body was not produced by Zopfli, while
/// a present one is inconclusive because plain gzip at maximum compression
/// on Unix writes the same ten bytes.
pub fn is_suspected_zopfli(bytes: &[u8]) -> bool {
    !bytes.starts_with(&ZOPFLI_HEADER)
}

/// Returns `true` if the response is compressed by any means.
///
/// Gzip and brotli are verified by bytes; any other non-`identity`
/// `Content-Encoding` (e.g. `deflate`) is taken at its word.
pub fn is_response_compressed(raw_response: &[u8], content_encoding: Option<&str>) -> bool {
    let declared = content_encoding
        .map(str::trim)
        .is_some_and(|v| !v.is_empty() && !v.eq_ignore_ascii_case("identity"));

    declared || is_gzip(raw_response) || is_brotli(raw_response)
}

/// Splits a `Content-Encoding` value into lowercase codings, in order.
pub fn content_encoding_tokens(header: &str) -> impl Iterator<Item = String> + '_ {
    header
        .split(',')
        .map(|part| part.trim().to_ascii_lowercase())
        .filter(|part| !part.is_empty())
}

/// Decodes a wire body into its payload.
///
/// The codec is taken from the bytes first, so a mislabelled or undeclared
/// gzip or brotli body still decodes. Declared codings are only trusted for
/// codecs the bytes cannot reveal (`deflate`); if such a decode fails the
/// bytes are kept as they are. Unknown codings are left as-is.
///
/// Fails only when bytes that look like gzip or brotli do not decode.
pub fn decode_body(raw_response: &[u8], content_encoding: Option<&str>) -> io::Result<Vec<u8>> {
    let mut codings: Vec<String> = content_encoding
        .map(|v| content_encoding_tokens(v).collect())
        .unwrap_or_default();

    let mut body = raw_response.to_vec();
    for _ in 0..MAX_CODING_LAYERS {
        let declared = codings.pop();

        match (Codec::detect(&body), declared.as_deref()) {
            (Some(codec), _) => {
                body = decode_all(codec.decoder().as_mut(), &body, usize::MAX)?.data;
            }
            (None, Some("deflate")) => {
                match decode_all(&mut DeflateDecoder::new(), &body, usize::MAX) {
                    Ok(decoded) => body = decoded.data,
                    Err(_) => break,
                }
            }
            // Mislabelled or unknown coding
            (None, Some(_)) => continue,
            (None, None) => break,
        }
    }

    Ok(body)
}

/// Output of a single complete decode pass.
struct Decoded {
    data: Vec<u8>,
    consumed: usize,
}

/// Runs `decoder` over all of `input` and finishes the stream.
///
/// At most `max_output` bytes are kept; decoding continues past that so
/// `consumed` still covers the whole stream.
fn decode_all(decoder: &mut dyn DecodeV2, input: &[u8], max_output: usize) -> io::Result<Decoded> {
    let mut input_buf = PartialBuffer::new(input);
    let mut output_buffer = vec![0u8; OUTPUT_BUFFER_SIZE];
    let mut data = Vec::new();

    loop {
        let mut output = WriteBuffer::new_initialized(output_buffer.as_mut_slice());
        let done = decoder.decode(&mut input_buf, &mut output)?;

        let written = output.written_len();
        let kept = written.min(max_output.saturating_sub(data.len()));
        data.extend_from_slice(&output_buffer[..kept]);

        if done {
            return Ok(Decoded {
                data,
                consumed: input_buf.written_len(),
            });
        }

        // Input exhausted or no progress: let finish decide
        if written == 0 {
            break;
        }
    }

    loop {
        let mut output = WriteBuffer::new_initialized(output_buffer.as_mut_slice());
        let done = decoder.finish(&mut output)?;

        let written = output.written_len();
        let kept = written.min(max_output.saturating_sub(data.len()));
        data.extend_from_slice(&output_buffer[..kept]);

        if done {
            return Ok(Decoded {
                data,
                consumed: input_buf.written_len(),
            });
        }

        if written == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "compressed stream ended early",
            ));
        }
    }
}
