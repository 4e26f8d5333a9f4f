//! Error types for configuration loading and resource audits.

use thiserror::Error;

/// Boxed error produced by a fetch client or a response body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while loading the compression policy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON or does not match the schema
    #[error("invalid compression configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A policy object was given without any codec flag
    #[error("compression configuration for `{scope}` must set at least one of gzip, zopfli, brotli")]
    EmptyPolicy {
        /// Which policy object was empty (`resource` or `target`)
        scope: &'static str,
    },
}

/// Errors that abort the audit of a single resource.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A probe request could not be completed
    #[error("probe of {url} failed: {source}")]
    Probe {
        /// URL that was probed
        url: String,
        /// Error returned by the fetch client
        #[source]
        source: BoxError,
    },

    /// The response body could not be collected
    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),

    /// The response body could not be decoded
    #[error("failed to decode response body: {0}")]
    Decode(#[from] std::io::Error),
}
