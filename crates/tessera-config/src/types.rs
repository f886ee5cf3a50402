//! Configuration types.
//!
//! These mirror domain types without depending on them; conversion happens at
//! the integration boundary. Every struct implements [`Default`] with the
//! same values as `defaults.toml`, so a bare `[section]` header still yields
//! a working configuration.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Signing key files.
    pub keys: KeysSection,
    /// Token lifetime.
    pub tokens: TokensSection,
    /// Role directory client.
    pub directory: DirectorySection,
    /// Log level, format and directives.
    pub logging: LoggingSection,
}

/// Signing key file locations and encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysSection {
    /// Secret key file (base64 text).
    pub secret_path: String,
    /// Public key file (base64 text).
    pub public_path: String,
    /// `"seed"` or `"expanded"`.
    pub encoding: String,
    /// Generate a keypair on first use when none exists.
    pub auto_generate: bool,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self {
            secret_path: "keys/secret.key".to_owned(),
            public_path: "keys/public.key".to_owned(),
            encoding: "seed".to_owned(),
            auto_generate: true,
        }
    }
}

/// Token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensSection {
    /// Lifetime of expiring tokens, in seconds.
    pub ttl_secs: u64,
}

impl Default for TokensSection {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

/// Role directory client settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DirectorySection {
    /// Base URL of the role directory. Unset means no directory.
    pub url: Option<String>,
    /// Bearer token sent with every lookup.
    pub token: Option<String>,
    /// Per-lookup timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_ms: 5000,
        }
    }
}

impl std::fmt::Debug for DirectorySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorySection")
            .field("url", &self.url)
            .field("has_token", &self.token.is_some())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Serialize for DirectorySection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DirectorySection", 2)?;
        state.serialize_field("url", &self.url)?;
        // token is never written back out.
        state.serialize_field("timeout_ms", &self.timeout_ms)?;
        state.end()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global level filter (`"trace"` through `"error"`).
    pub level: String,
    /// `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate directives (e.g. `["reqwest=warn"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_embedded_toml() {
        let parsed: Config = toml::from_str(include_str!("defaults.toml")).unwrap();
        let built = Config::default();

        assert_eq!(parsed.keys.secret_path, built.keys.secret_path);
        assert_eq!(parsed.keys.public_path, built.keys.public_path);
        assert_eq!(parsed.keys.encoding, built.keys.encoding);
        assert_eq!(parsed.keys.auto_generate, built.keys.auto_generate);
        assert_eq!(parsed.tokens.ttl_secs, built.tokens.ttl_secs);
        assert_eq!(parsed.directory.timeout_ms, built.directory.timeout_ms);
        assert_eq!(parsed.logging.level, built.logging.level);
        assert_eq!(parsed.logging.format, built.logging.format);
    }

    #[test]
    fn test_bare_sections_take_defaults() {
        let config: Config = toml::from_str("[keys]\n[tokens]\n").unwrap();
        assert_eq!(config.tokens.ttl_secs, 600);
        assert_eq!(config.keys.encoding, "seed");
    }

    #[test]
    fn test_directory_token_is_redacted() {
        let section = DirectorySection {
            url: Some("https://dir.example".into()),
            token: Some("hunter2".into()),
            timeout_ms: 100,
        };
        let debug = format!("{section:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("has_token: true"));

        let serialized = toml::to_string(&section).unwrap();
        assert!(!serialized.contains("hunter2"));
    }
}
