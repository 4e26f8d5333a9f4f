//! HTTP response compression compliance checks.
//!
//! This crate inspects fetched resources and verifies that they are served
//! with the content compression a [`CompressionPolicy`] requires. The codec
//! is detected from the bytes on the wire, not taken from the headers.
//!
//! # Example
//!
//! ```ignore
//! use http_compression_audit::{CompressionAudit, DiagnosticLog, Policies};
//!
//! let policies = Policies::from_json_str(r#"{ "resource": { "zopfli": false } }"#)?;
//! let audit = CompressionAudit::new(fetch_service, DiagnosticLog::new(), policies);
//!
//! audit.on_fetch_end_target(&document).await?;
//! for diagnostic in audit.sink().snapshot() {
//!     println!("{}: {}", diagnostic.resource_url, diagnostic.message);
//! }
//! ```
//!
//! # Audit Rules
//!
//! A resource is **not** checked when:
//! - The status code is not `200`
//! - The URL scheme is not `http` or `https`
//!
//! The audit **stops early** when:
//! - The resource is SVG (or `.svgz`) and its bytes are gzip; it only needs
//!   `Content-Encoding: gzip`
//! - The media type does not benefit from compression; it must then be
//!   served uncompressed and without `Content-Encoding`
//!
//! Otherwise the audit reports:
//! - `Content-Encoding` codings other than `gzip` and `br` (`x-gzip` is
//!   tolerated for real gzip bodies), and SDCH `Get-Dictionary` headers
//! - Compressed answers to `Accept-Encoding: identity`
//! - Missing gzip or Zopfli output for `Accept-Encoding: gzip`
//! - Missing brotli for `Accept-Encoding: br` over HTTPS, or brotli over
//!   plain HTTP
//! - Compressed bodies that are not smaller than their content
//! - A missing `Vary: Accept-Encoding` on public responses and a
//!   `Content-Encoding` that does not match the bytes
//! - Compression that changes with the `User-Agent`

#![deny(missing_docs)]

mod audit;
pub mod codec;
mod error;
pub mod headers;
pub mod media_type;
mod mime_db;
mod policy;
mod report;
mod resource;
pub mod size;

#[cfg(test)]
mod testing;

pub use audit::{CompressionAudit, Flow, Outcome, Step};
pub use codec::{Codec, Compressor};
pub use error::{AuditError, BoxError, ConfigError};
pub use policy::{CompressionPolicy, FetchKind, Policies};
pub use report::{Diagnostic, DiagnosticLog, ReportSink};
pub use resource::{DESKTOP_USER_AGENT, FetchedResource, ProbeRequest, ResponseBody};
