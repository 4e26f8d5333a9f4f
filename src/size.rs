//! Detection of compression that does not shrink the body.

use crate::codec::Compressor;
use std::cmp::Ordering;

/// Returns `true` when compression did not make the body smaller.
pub fn should_flag_as_no_benefit(compressed_len: usize, uncompressed_len: usize) -> bool {
    compressed_len >= uncompressed_len
}

/// Flags a response whose compressed body is not smaller than its content.
///
/// Only meaningful when `Content-Encoding` claims the codec `compressor`
/// belongs to; the caller decides that.
pub fn check_size(
    compressor: Compressor,
    compressed_len: usize,
    uncompressed_len: usize,
) -> Option<String> {
    if !should_flag_as_no_benefit(compressed_len, uncompressed_len) {
        return None;
    }

    let comparison = match compressed_len.cmp(&uncompressed_len) {
        Ordering::Equal => "the same as",
        _ => "bigger than",
    };

    Some(format!(
        "Response should not be served compressed with {compressor} as the compressed size is {comparison} uncompressed one."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_flag() {
        assert!(should_flag_as_no_benefit(10, 10));
        assert!(should_flag_as_no_benefit(11, 10));
        assert!(!should_flag_as_no_benefit(9, 10));
        assert!(should_flag_as_no_benefit(0, 0));
    }

    #[test]
    fn test_smaller_passes() {
        assert!(check_size(Compressor::Gzip, 100, 1000).is_none());
    }

    #[test]
    fn test_same_size_message() {
        assert_eq!(
            check_size(Compressor::Brotli, 20, 20).unwrap(),
            "Response should not be served compressed with Brotli as the compressed size is the same as uncompressed one."
        );
    }

    #[test]
    fn test_bigger_message_names_zopfli() {
        assert_eq!(
            check_size(Compressor::Zopfli, 30, 20).unwrap(),
            "Response should not be served compressed with Zopfli as the compressed size is bigger than uncompressed one."
        );
    }
}
