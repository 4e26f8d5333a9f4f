//! Snapshots of fetched responses and the requests that re-fetch them.

use crate::codec;
use crate::error::AuditError;
use crate::headers;
use crate::media_type;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Response, StatusCode, header};
use http_body::Body;
use http_body_util::BodyExt;
use url::Url;

/// Desktop browser `User-Agent` used to detect user-agent sniffing.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Body of a completed exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseBody {
    /// Bytes exactly as they arrived on the wire.
    pub raw_response: Bytes,
    /// Fully decoded payload.
    pub raw_content: Bytes,
}

/// Immutable snapshot of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// URL of the resource.
    pub url: Url,
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Declared media type, normalized.
    pub media_type: String,
    /// Reference to the element that caused the fetch, if any.
    pub element: Option<String>,
    /// Response body.
    pub body: ResponseBody,
}

impl FetchedResource {
    /// Creates a snapshot whose media type comes from `Content-Type`.
    pub fn new(
        url: Url,
        status: StatusCode,
        headers: HeaderMap,
        raw_response: Bytes,
        raw_content: Bytes,
    ) -> Self {
        let media_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type::normalize)
            .unwrap_or_default();

        Self {
            url,
            status,
            headers,
            media_type,
            element: None,
            body: ResponseBody {
                raw_response,
                raw_content,
            },
        }
    }

    /// Builds a snapshot from a response whose body is still encoded.
    ///
    /// The body is collected as-is into `raw_response` and decoded into
    /// `raw_content`. Gzip and brotli are recognized from the bytes, so a
    /// wrong or missing `Content-Encoding` still yields the real payload and
    /// is left for the audit to report.
    pub async fn from_http_response<B>(url: Url, response: Response<B>) -> Result<Self, AuditError>
    where
        B: Body,
        B::Error: Into<crate::error::BoxError>,
    {
        let (parts, body) = response.into_parts();
        let raw_response = body
            .collect()
            .await
            .map_err(|e| AuditError::Body(e.into()))?
            .to_bytes();

        let raw_content = codec::decode_body(
            &raw_response,
            headers::content_encoding(&parts.headers).as_deref(),
        )?;

        Ok(Self::new(
            url,
            parts.status,
            parts.headers,
            raw_response,
            Bytes::from(raw_content),
        ))
    }

    /// Overrides the declared media type.
    pub fn with_media_type(mut self, value: &str) -> Self {
        self.media_type = media_type::normalize(value);
        self
    }

    /// Attaches the element that caused the fetch.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Returns the URL scheme.
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Returns `true` if the resource was fetched over HTTPS.
    pub fn is_https(&self) -> bool {
        self.scheme() == "https"
    }

    /// Returns `true` for plain HTTP(S) resources.
    pub fn is_regular_protocol(&self) -> bool {
        matches!(self.scheme(), "http" | "https")
    }

    /// Returns the lowercase extension of the last path segment.
    pub fn extension(&self) -> Option<String> {
        let segment = self.url.path_segments()?.last()?;
        let (_, extension) = segment.rsplit_once('.')?;
        (!extension.is_empty()).then(|| extension.to_ascii_lowercase())
    }

    /// Returns the declared `Content-Encoding`, normalized.
    pub fn content_encoding(&self) -> Option<String> {
        headers::content_encoding(&self.headers)
    }
}

/// A request for the same resource under controlled headers.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    /// URL to fetch.
    pub url: Url,
    /// Extra request headers.
    pub headers: HeaderMap,
}

impl ProbeRequest {
    /// Creates a probe asking for `accept_encoding`.
    pub fn accept_encoding(url: Url, accept_encoding: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT_ENCODING,
            HeaderValue::from_static(accept_encoding),
        );
        Self { url, headers }
    }

    /// Adds the desktop browser `User-Agent`.
    pub fn with_desktop_user_agent(mut self) -> Self {
        self.headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(DESKTOP_USER_AGENT),
        );
        self
    }

    /// Converts the probe into an `http::Request` with an empty body.
    pub fn into_http_request(self) -> http::Result<http::Request<()>> {
        let mut request = http::Request::get(self.url.as_str()).body(())?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}
