//! Consistency checks for negotiation related response headers.

use crate::codec::{Codec, content_encoding_tokens, is_gzip};
use http::header::{self, HeaderMap, HeaderName};

/// Response header SDCH servers use to advertise a shared dictionary.
pub const GET_DICTIONARY: HeaderName = HeaderName::from_static("get-dictionary");

/// Returns all comma-separated entries of `name`, trimmed and lowercased.
///
/// Repeated header lines are treated as one list, as RFC 9110 allows.
pub fn header_list(headers: &HeaderMap, name: impl header::AsHeaderName) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|entry| entry.trim().to_ascii_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Returns the `Content-Encoding` value, trimmed and lowercased, if present
/// and non-empty.
pub fn content_encoding(headers: &HeaderMap) -> Option<String> {
    let value = header_list(headers, header::CONTENT_ENCODING).join(", ");
    (!value.is_empty()).then_some(value)
}

/// Checks that a shared cache can tell encodings apart.
///
/// `Vary` must contain `accept-encoding` unless `Cache-Control` marks the
/// response `private`.
pub fn check_vary(headers: &HeaderMap) -> Option<String> {
    // `private="set-cookie"` counts as private too
    let is_private = header_list(headers, header::CACHE_CONTROL)
        .iter()
        .any(|directive| directive.split('=').next().map(str::trim) == Some("private"));

    let varies_on_encoding = header_list(headers, header::VARY)
        .iter()
        .any(|field| field == "accept-encoding");

    if is_private || varies_on_encoding {
        return None;
    }

    Some("Response should include 'vary' header containing 'accept-encoding' value.".to_owned())
}

/// Checks that the declared `Content-Encoding` names the codec found in the
/// body bytes.
pub fn check_content_encoding(codec: Codec, declared: Option<&str>) -> Option<String> {
    let expected = codec.content_encoding();

    if declared.is_some_and(|value| value.trim().eq_ignore_ascii_case(expected)) {
        return None;
    }

    Some(format!(
        "Response should include 'content-encoding: {expected}' header."
    ))
}

/// Returns one message per coding other than `gzip` and `br`.
///
/// `x-gzip` is tolerated as a legacy alias when the body really is gzip.
pub fn disallowed_encodings(declared: Option<&str>, raw_response: &[u8]) -> Vec<String> {
    let Some(declared) = declared else {
        return Vec::new();
    };

    content_encoding_tokens(declared)
        .filter(|coding| coding != "gzip" && coding != "br")
        .filter(|coding| !(coding == "x-gzip" && is_gzip(raw_response)))
        .map(|coding| {
            format!("Response should not include disallowed 'content-encoding: {coding}' header.")
        })
        .collect()
}

/// Flags the deprecated SDCH scheme.
pub fn check_sdch(headers: &HeaderMap) -> Option<String> {
    let advertised = headers
        .get(GET_DICTIONARY)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().is_empty());

    advertised.then(|| {
        "Response should not be compressed using SDCH (deprecated 'get-dictionary' header)."
            .to_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gzip, headers};

    #[test]
    fn test_header_list_merges_lines() {
        let headers = headers([("vary", "Origin, Accept-Encoding"), ("vary", "cookie")]);
        assert_eq!(
            header_list(&headers, header::VARY),
            vec!["origin", "accept-encoding", "cookie"]
        );
    }

    #[test]
    fn test_content_encoding() {
        assert_eq!(
            content_encoding(&headers([("content-encoding", " GZIP ")])),
            Some("gzip".to_owned())
        );
        assert_eq!(content_encoding(&headers([("content-encoding", "")])), None);
        assert_eq!(content_encoding(&HeaderMap::new()), None);
    }

    #[test]
    fn test_vary_missing() {
        assert!(check_vary(&HeaderMap::new()).is_some());
        assert!(check_vary(&headers([("vary", "origin")])).is_some());
        assert!(check_vary(&headers([("cache-control", "public, max-age=60")])).is_some());
    }

    #[test]
    fn test_vary_present() {
        assert!(check_vary(&headers([("vary", "Accept-Encoding")])).is_none());
        assert!(check_vary(&headers([("vary", "origin"), ("vary", "accept-encoding")])).is_none());
    }

    #[test]
    fn test_vary_waived_for_private() {
        assert!(check_vary(&headers([("cache-control", "Private, max-age=0")])).is_none());
        assert!(check_vary(&headers([("cache-control", "private=\"set-cookie\"")])).is_none());
    }

    #[test]
    fn test_check_content_encoding() {
        assert!(check_content_encoding(Codec::Gzip, Some("gzip")).is_none());
        assert!(check_content_encoding(Codec::Brotli, Some("br")).is_none());
        assert_eq!(
            check_content_encoding(Codec::Gzip, None).unwrap(),
            "Response should include 'content-encoding: gzip' header."
        );
        assert!(check_content_encoding(Codec::Brotli, Some("gzip")).is_some());
    }

    #[test]
    fn test_disallowed_encodings() {
        let body = b"<p>plain</p>";
        assert!(disallowed_encodings(None, body).is_empty());
        assert!(disallowed_encodings(Some("gzip"), body).is_empty());
        assert!(disallowed_encodings(Some("br"), body).is_empty());
        assert_eq!(
            disallowed_encodings(Some("deflate, compress"), body),
            vec![
                "Response should not include disallowed 'content-encoding: deflate' header.",
                "Response should not include disallowed 'content-encoding: compress' header.",
            ]
        );
    }

    #[test]
    fn test_x_gzip_alias() {
        assert!(disallowed_encodings(Some("x-gzip"), &gzip(b"<p>x</p>")).is_empty());
        assert_eq!(disallowed_encodings(Some("x-gzip"), b"<p>x</p>").len(), 1);
    }

    #[test]
    fn test_sdch() {
        assert!(check_sdch(&HeaderMap::new()).is_none());
        assert!(check_sdch(&headers([("get-dictionary", "")])).is_none());
        assert!(check_sdch(&headers([("get-dictionary", "/dict")])).is_some());
    }
}
