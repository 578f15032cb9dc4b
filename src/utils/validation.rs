//! Input validation utilities
//!
//! Local checks run before any network call so malformed input never
//! reaches the remote service.

use crate::error::ApiError;
use url::Url;

/// Fixed prefix of keys issued for the CMS integration.
pub const API_KEY_PREFIX: &str = "modstack_wp_";
const API_KEY_HASH_LEN: usize = 64;

/// Validate that a URL parses as an absolute http(s) URL
pub fn validate_url(url: &str) -> Result<Url, ApiError> {
    let invalid = || ApiError::InvalidUrlFormat {
        url: url.to_string(),
    };

    let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }

    Ok(parsed)
}

/// Validate API key format: `modstack_wp_` followed by 64 lowercase hex characters
pub fn validate_api_key(api_key: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::InvalidKeyFormat {
        key_length: api_key.len(),
    };

    let hash = api_key.strip_prefix(API_KEY_PREFIX).ok_or_else(invalid)?;
    if hash.len() != API_KEY_HASH_LEN
        || !hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(invalid());
    }

    Ok(())
}

/// Require a non-empty (after trimming) parameter value
pub fn require_param<'a>(value: Option<&'a str>, parameter: &str) -> Result<&'a str, ApiError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::MissingParameter {
            parameter: parameter.to_string(),
        }),
    }
}
