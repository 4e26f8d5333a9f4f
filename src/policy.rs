//! Compression policies and their JSON configuration.
//!
//! The configuration is an object with optional `resource` and `target`
//! entries:
//!
//! ```json
//! { "resource": { "zopfli": false }, "target": { "brotli": false } }
//! ```
//!
//! Every flag defaults to `true`; an entry that is present must name at
//! least one flag, and unknown keys are rejected.

use crate::error::ConfigError;
use serde::Deserialize;

/// Codecs a class of responses is required to be served with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    /// Require gzip when gzip is requested.
    pub require_gzip: bool,
    /// Require Zopfli-produced gzip when gzip is requested.
    pub require_zopfli: bool,
    /// Require brotli when brotli is requested over HTTPS.
    pub require_brotli: bool,
}

impl CompressionPolicy {
    /// Returns `true` if any gzip family check applies.
    pub fn checks_gzip(&self) -> bool {
        self.require_gzip || self.require_zopfli
    }
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            require_gzip: true,
            require_zopfli: true,
            require_brotli: true,
        }
    }
}

/// Kind of fetch that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// A subresource of the page.
    Resource,
    /// The web app manifest.
    Manifest,
    /// The top-level document.
    Target,
}

/// The two named policies of an audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policies {
    /// Applies to subresources and the manifest.
    pub resource: CompressionPolicy,
    /// Applies to the top-level document.
    pub target: CompressionPolicy,
}

impl Policies {
    /// Loads policies from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let options: Options = serde_json::from_str(json)?;
        options.into_policies()
    }

    /// Loads policies from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let options: Options = serde_json::from_value(value)?;
        options.into_policies()
    }

    /// Returns the policy that governs `kind`.
    pub fn for_kind(&self, kind: FetchKind) -> &CompressionPolicy {
        match kind {
            FetchKind::Resource | FetchKind::Manifest => &self.resource,
            FetchKind::Target => &self.target,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Options {
    #[serde(default)]
    resource: Option<PolicyOptions>,
    #[serde(default)]
    target: Option<PolicyOptions>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyOptions {
    gzip: Option<bool>,
    zopfli: Option<bool>,
    brotli: Option<bool>,
}

impl Options {
    fn into_policies(self) -> Result<Policies, ConfigError> {
        Ok(Policies {
            resource: resolve(self.resource, "resource")?,
            target: resolve(self.target, "target")?,
        })
    }
}

fn resolve(
    options: Option<PolicyOptions>,
    scope: &'static str,
) -> Result<CompressionPolicy, ConfigError> {
    let Some(options) = options else {
        return Ok(CompressionPolicy::default());
    };

    if options.gzip.is_none() && options.zopfli.is_none() && options.brotli.is_none() {
        return Err(ConfigError::EmptyPolicy { scope });
    }

    Ok(CompressionPolicy {
        require_gzip: options.gzip.unwrap_or(true),
        require_zopfli: options.zopfli.unwrap_or(true),
        require_brotli: options.brotli.unwrap_or(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let policies = Policies::from_json_str("{}").unwrap();
        assert_eq!(policies, Policies::default());
        assert!(policies.resource.require_zopfli);
    }

    #[test]
    fn test_partial_policy() {
        let policies = Policies::from_value(json!({
            "resource": { "zopfli": false },
            "target": { "gzip": true, "brotli": false }
        }))
        .unwrap();

        assert_eq!(
            policies.resource,
            CompressionPolicy {
                require_gzip: true,
                require_zopfli: false,
                require_brotli: true,
            }
        );
        assert!(!policies.target.require_brotli);
        assert!(policies.target.require_zopfli);
    }

    #[test]
    fn test_empty_policy_rejected() {
        let err = Policies::from_json_str(r#"{ "target": {} }"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPolicy { scope: "target" }));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(matches!(
            Policies::from_json_str(r#"{ "resource": { "zstd": true } }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Policies::from_json_str(r#"{ "other": {} }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert!(Policies::from_json_str(r#"{ "resource": { "gzip": "yes" } }"#).is_err());
    }

    #[test]
    fn test_for_kind() {
        let policies = Policies {
            resource: CompressionPolicy::default(),
            target: CompressionPolicy {
                require_gzip: true,
                require_zopfli: false,
                require_brotli: false,
            },
        };
        assert_eq!(policies.for_kind(FetchKind::Resource), &policies.resource);
        assert_eq!(policies.for_kind(FetchKind::Manifest), &policies.resource);
        assert_eq!(policies.for_kind(FetchKind::Target), &policies.target);
        assert!(!policies.for_kind(FetchKind::Target).require_brotli);
    }
}
