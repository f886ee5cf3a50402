//! Post-merge configuration validation.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Longest accepted token lifetime (24 hours).
pub const MAX_TTL_SECS: u64 = 24 * 60 * 60;

/// Longest accepted directory timeout (one minute).
pub const MAX_DIRECTORY_TIMEOUT_MS: u64 = 60_000;

/// Validate a merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first [`ConfigError::ValidationError`] found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_keys(config)?;
    validate_tokens(config)?;
    validate_directory(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_keys(config: &Config) -> ConfigResult<()> {
    let k = &config.keys;

    if k.secret_path.trim().is_empty() {
        return Err(invalid("keys.secret_path", "must not be empty"));
    }
    if k.public_path.trim().is_empty() {
        return Err(invalid("keys.public_path", "must not be empty"));
    }
    if k.secret_path.trim() == k.public_path.trim() {
        return Err(invalid(
            "keys.public_path",
            "must differ from keys.secret_path",
        ));
    }
    if !matches!(
        k.encoding.trim().to_ascii_lowercase().as_str(),
        "seed" | "expanded"
    ) {
        return Err(invalid(
            "keys.encoding",
            format!(
                "unsupported encoding '{}'; expected one of: seed, expanded",
                k.encoding
            ),
        ));
    }
    Ok(())
}

fn validate_tokens(config: &Config) -> ConfigResult<()> {
    let ttl = config.tokens.ttl_secs;
    if ttl == 0 || ttl > MAX_TTL_SECS {
        return Err(invalid(
            "tokens.ttl_secs",
            format!("ttl {ttl} is out of range; must be between 1 and {MAX_TTL_SECS}"),
        ));
    }
    Ok(())
}

fn validate_directory(config: &Config) -> ConfigResult<()> {
    let d = &config.directory;

    if d.timeout_ms == 0 || d.timeout_ms > MAX_DIRECTORY_TIMEOUT_MS {
        return Err(invalid(
            "directory.timeout_ms",
            format!(
                "timeout {} is out of range; must be between 1 and {MAX_DIRECTORY_TIMEOUT_MS}",
                d.timeout_ms
            ),
        ));
    }

    if let Some(ref raw) = d.url {
        let url = Url::parse(raw)
            .map_err(|e| invalid("directory.url", format!("'{raw}' is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(
                "directory.url",
                format!("scheme '{}' is not allowed; use http or https", url.scheme()),
            ));
        }
    }

    if d.token.is_some() && d.url.is_none() {
        return Err(invalid(
            "directory.token",
            "a token is set but directory.url is not",
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        ));
    }
    if !matches!(
        l.format.to_ascii_lowercase().as_str(),
        "pretty" | "compact" | "json" | "full"
    ) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        ));
    }
    Ok(())
}
