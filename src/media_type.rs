//! Classification of media types by how much they gain from compression.

use crate::mime_db;

/// Binary types that compress well but are commonly mislabeled in registries.
const ALWAYS_COMPRESSIBLE: &[&str] = &["image/bmp", "image/vnd.microsoft.icon", "image/x-icon"];

/// Formats that are already compressed internally.
const NEVER_COMPRESSIBLE: &[&str] = &[
    "font/otf",
    "font/ttf",
    "font/woff",
    "font/woff2",
    "image/gif",
    "image/jpeg",
    "image/png",
];

/// Application types that are plain text under another name.
const TEXTUAL_APPLICATION_TYPES: &[&str] = &[
    "application/javascript",
    "application/json",
    "application/x-javascript",
    "application/xml",
];

/// Strips parameters from a media type and lowercases it.
///
/// `text/HTML; charset=utf-8` becomes `text/html`. Values `mime` cannot
/// parse are cut at the first `;` instead.
pub fn normalize(media_type: &str) -> String {
    match media_type.trim().parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
    }
}

/// Returns `true` for media types that are text in disguise.
fn is_textual(media_type: &str) -> bool {
    if media_type.starts_with("text/") || media_type == "image/svg+xml" {
        return true;
    }

    if TEXTUAL_APPLICATION_TYPES.contains(&media_type) {
        return true;
    }

    media_type
        .strip_prefix("application/")
        .is_some_and(|subtype| subtype.ends_with("+json") || subtype.ends_with("+xml"))
}

/// Returns `true` if content of `media_type` is expected to benefit from
/// compression.
///
/// Text and a few hand-picked binary formats are decided up front; the
/// static registry covers the long tail, and unknown types are treated as
/// not compressible.
pub fn is_compressible(media_type: &str) -> bool {
    let media_type = normalize(media_type);

    if media_type.is_empty() {
        return false;
    }

    if is_textual(&media_type) || ALWAYS_COMPRESSIBLE.contains(&media_type.as_str()) {
        return true;
    }

    if NEVER_COMPRESSIBLE.contains(&media_type.as_str()) {
        return false;
    }

    mime_db::compressible(&media_type).unwrap_or(false)
}

/// Returns `true` for SVG documents, which may be served as implicit gzip.
pub fn is_svg(media_type: &str) -> bool {
    normalize(media_type) == "image/svg+xml"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("text/HTML; charset=utf-8"), "text/html");
        assert_eq!(normalize("  application/json "), "application/json");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_text_is_compressible() {
        assert!(is_compressible("text/html"));
        assert!(is_compressible("text/css; charset=utf-8"));
        assert!(is_compressible("text/x-made-up"));
        assert!(is_compressible("application/javascript"));
        assert!(is_compressible("application/vnd.custom+json"));
        assert!(is_compressible("application/soap+xml"));
        assert!(is_compressible("image/svg+xml"));
    }

    #[test]
    fn test_empty_is_not_compressible() {
        assert!(!is_compressible(""));
        assert!(!is_compressible("   "));
    }

    #[test]
    fn test_override_lists() {
        assert!(is_compressible("image/x-icon"));
        assert!(is_compressible("image/bmp"));
        assert!(!is_compressible("image/png"));
        assert!(!is_compressible("image/jpeg"));
        assert!(!is_compressible("font/woff2"));
        assert!(!is_compressible("font/ttf"));
    }

    #[test]
    fn test_registry_fallback() {
        assert!(is_compressible("application/wasm"));
        assert!(is_compressible("application/vnd.ms-fontobject"));
        assert!(!is_compressible("application/pdf"));
        assert!(!is_compressible("image/webp"));
        assert!(!is_compressible("application/x-never-registered"));
    }

    #[test]
    fn test_is_svg() {
        assert!(is_svg("image/svg+xml"));
        assert!(is_svg("image/SVG+xml; charset=utf-8"));
        assert!(!is_svg("image/png"));
    }
}
