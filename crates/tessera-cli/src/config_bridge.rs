//! Bridge from `tessera_config::Config` to domain types.

use std::time::Duration;

use anyhow::{Context, Result};
use tessera_config::Config;
use tessera_crypto::{KeyEncoding, KeyStore};
use tessera_permissions::{HttpRoleDirectory, PermissionEvaluator, RoleDirectory};
use tessera_telemetry::{LogConfig, LogFormat};
use tessera_token::TokenService;

/// Key store over the configured paths and encoding.
///
/// # Errors
///
/// Fails if the encoding is not recognized.
pub fn to_key_store(config: &Config) -> Result<KeyStore> {
    let encoding: KeyEncoding = config
        .keys
        .encoding
        .parse()
        .context("invalid keys.encoding")?;
    Ok(KeyStore::new(
        &config.keys.secret_path,
        &config.keys.public_path,
        encoding,
    ))
}

/// Token service backed by the configured keys.
///
/// Generates a keypair on first use when `keys.auto_generate` is set;
/// otherwise the keys must already be provisioned.
///
/// # Errors
///
/// Fails if the keys cannot be loaded or generated.
pub fn to_token_service(config: &Config) -> Result<TokenService> {
    let store = to_key_store(config)?;
    let keypair = if config.keys.auto_generate {
        store.load_or_generate()
    } else {
        store.load()
    }
    .with_context(|| format!("failed to load keys from {}", store.secret_path().display()))?;

    Ok(TokenService::new(keypair).with_ttl(Duration::from_secs(config.tokens.ttl_secs)))
}

/// Permission evaluator over the configured HTTP role directory, if any.
///
/// # Errors
///
/// Fails if the directory client cannot be built.
pub fn to_evaluator(config: &Config) -> Result<Option<PermissionEvaluator>> {
    let Some(ref url) = config.directory.url else {
        return Ok(None);
    };
    let timeout = Duration::from_millis(config.directory.timeout_ms);

    let mut directory =
        HttpRoleDirectory::new(url, timeout).context("invalid role directory settings")?;
    if let Some(ref token) = config.directory.token {
        directory = directory.with_bearer_token(token.clone());
    }

    let directory: std::sync::Arc<dyn RoleDirectory> = std::sync::Arc::new(directory);
    Ok(Some(
        PermissionEvaluator::new(directory).with_lookup_timeout(timeout),
    ))
}

/// Logging settings from the `[logging]` section.
#[must_use]
pub fn to_log_config(config: &Config) -> LogConfig {
    let format = config
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();
    LogConfig::new(config.logging.level.clone())
        .with_format(format)
        .with_directives(config.logging.directives.iter().cloned())
}
