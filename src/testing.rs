//! Fixture builders shared by the unit tests.

use crate::resource::{FetchedResource, ProbeRequest};
use bytes::Bytes;
use compression_codecs::{
    EncodeV2,
    brotli::{BrotliEncoder, params::EncoderParams as BrotliParams},
    gzip::GzipEncoder,
};
use compression_core::Level;
use compression_core::util::{PartialBuffer, WriteBuffer};
use http::{HeaderMap, HeaderValue, StatusCode, header};
use url::Url;

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024;

/// A compressible page whose first byte is never a valid brotli stream start.
pub(crate) fn page() -> Vec<u8> {
    let mut page = b"<!doctype html><title>fixture</title>".to_vec();
    page.extend_from_slice("<p>hello compression</p>".repeat(200).as_bytes());
    page
}

fn encode(mut encoder: Box<dyn EncodeV2 + Send>, input: &[u8]) -> Vec<u8> {
    let mut input_buf = PartialBuffer::new(input);
    let mut output_buffer = vec![0u8; OUTPUT_BUFFER_SIZE];
    let mut compressed = Vec::new();

    while input_buf.written_len() < input.len() {
        let mut output = WriteBuffer::new_initialized(output_buffer.as_mut_slice());
        encoder.encode(&mut input_buf, &mut output).unwrap();
        let written = output.written_len();
        compressed.extend_from_slice(&output_buffer[..written]);
    }

    loop {
        let mut output = WriteBuffer::new_initialized(output_buffer.as_mut_slice());
        let done = encoder.finish(&mut output).unwrap();
        let written = output.written_len();
        compressed.extend_from_slice(&output_buffer[..written]);
        if done {
            return compressed;
        }
    }
}

pub(crate) fn gzip(input: &[u8]) -> Vec<u8> {
    encode(Box::new(GzipEncoder::new(Level::Default.into())), input)
}

/// Gzip output carrying the header Zopfli writes. XFL and OS are advisory,
/// so the stream stays valid.
pub(crate) fn zopfli(input: &[u8]) -> Vec<u8> {
    let mut compressed = gzip(input);
    compressed[8] = 0x02;
    compressed[9] = 0x03;
    compressed
}

pub(crate) fn brotli(input: &[u8]) -> Vec<u8> {
    encode(Box::new(BrotliEncoder::new(BrotliParams::default())), input)
}

pub(crate) fn headers<I>(pairs: I) -> HeaderMap
where
    I: IntoIterator<Item = (&'static str, &'static str)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.append(name, HeaderValue::from_static(value));
    }
    headers
}

/// Builds a 200 response snapshot for `url`.
pub(crate) fn resource(url: &str, headers: HeaderMap, raw_response: Vec<u8>) -> FetchedResource {
    let raw_content = crate::codec::decode_body(
        &raw_response,
        headers
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok()),
    )
    .unwrap_or_else(|_| raw_response.clone());

    FetchedResource::new(
        Url::parse(url).unwrap(),
        StatusCode::OK,
        headers,
        Bytes::from(raw_response),
        Bytes::from(raw_content),
    )
}

/// Accept-Encoding of a probe, `""` when absent.
pub(crate) fn accept_encoding(probe: &ProbeRequest) -> &str {
    probe
        .headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

pub(crate) fn has_user_agent(probe: &ProbeRequest) -> bool {
    probe.headers.contains_key(header::USER_AGENT)
}
