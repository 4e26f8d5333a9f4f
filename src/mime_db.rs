//! Static subset of the IANA/Apache media type registry with the
//! `compressible` flag of the `mime-db` project.
//!
//! Entries are sorted by name so lookups can binary search.

static REGISTRY: &[(&str, bool)] = &[
    ("application/atom+xml", true),
    ("application/dart", true),
    ("application/ecmascript", true),
    ("application/epub+zip", false),
    ("application/geo+json", true),
    ("application/gzip", false),
    ("application/java-archive", false),
    ("application/javascript", true),
    ("application/json", true),
    ("application/ld+json", true),
    ("application/manifest+json", true),
    ("application/msword", false),
    ("application/octet-stream", false),
    ("application/ogg", false),
    ("application/pdf", false),
    ("application/postscript", true),
    ("application/problem+json", true),
    ("application/rdf+xml", true),
    ("application/rss+xml", true),
    ("application/rtf", true),
    ("application/tar", true),
    ("application/toml", true),
    ("application/vnd.api+json", true),
    ("application/vnd.geo+json", true),
    ("application/vnd.google-earth.kml+xml", true),
    ("application/vnd.google-earth.kmz", false),
    ("application/vnd.ms-excel", false),
    ("application/vnd.ms-fontobject", true),
    ("application/vnd.ms-opentype", true),
    ("application/vnd.openxmlformats-officedocument.presentationml.presentation", false),
    ("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", false),
    ("application/vnd.openxmlformats-officedocument.wordprocessingml.document", false),
    ("application/wasm", true),
    ("application/x-7z-compressed", false),
    ("application/x-bzip2", false),
    ("application/x-font-opentype", true),
    ("application/x-font-truetype", true),
    ("application/x-font-ttf", true),
    ("application/x-gzip", false),
    ("application/x-httpd-php", true),
    ("application/x-javascript", true),
    ("application/x-latex", true),
    ("application/x-mpegurl", false),
    ("application/x-rar-compressed", false),
    ("application/x-sh", true),
    ("application/x-shockwave-flash", false),
    ("application/x-tar", true),
    ("application/x-web-app-manifest+json", true),
    ("application/x-www-form-urlencoded", true),
    ("application/x-xz", false),
    ("application/xhtml+xml", true),
    ("application/xml", true),
    ("application/xml-dtd", true),
    ("application/zip", false),
    ("audio/aac", false),
    ("audio/midi", false),
    ("audio/mp4", false),
    ("audio/mpeg", false),
    ("audio/ogg", false),
    ("audio/wav", false),
    ("audio/webm", false),
    ("font/collection", true),
    ("font/otf", true),
    ("font/sfnt", true),
    ("font/ttf", true),
    ("font/woff", false),
    ("font/woff2", false),
    ("image/avif", false),
    ("image/bmp", true),
    ("image/gif", false),
    ("image/jpeg", false),
    ("image/png", false),
    ("image/svg+xml", true),
    ("image/tiff", false),
    ("image/vnd.microsoft.icon", true),
    ("image/webp", false),
    ("image/x-icon", true),
    ("multipart/form-data", false),
    ("text/cache-manifest", true),
    ("text/calendar", true),
    ("text/css", true),
    ("text/csv", true),
    ("text/event-stream", true),
    ("text/html", true),
    ("text/javascript", true),
    ("text/markdown", true),
    ("text/plain", true),
    ("text/vcard", true),
    ("text/vtt", true),
    ("text/x-component", true),
    ("text/xml", true),
    ("video/mp2t", false),
    ("video/mp4", false),
    ("video/mpeg", false),
    ("video/ogg", false),
    ("video/quicktime", false),
    ("video/webm", false),
];

/// Looks up the `compressible` flag of a normalized media type.
///
/// Returns `None` when the type is not in the registry.
pub(crate) fn compressible(media_type: &str) -> Option<bool> {
    REGISTRY
        .binary_search_by(|(name, _)| name.cmp(&media_type))
        .ok()
        .map(|index| REGISTRY[index].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_sorted() {
        assert!(REGISTRY.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(compressible("application/wasm"), Some(true));
        assert_eq!(compressible("application/zip"), Some(false));
        assert_eq!(compressible("application/x-unknown"), None);
    }
}
