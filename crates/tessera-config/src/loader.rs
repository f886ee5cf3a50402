//! Layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge the config file, if one is named by the caller or `TESSERA_CONFIG`
//! 3. Apply environment fallbacks to fields the file did not set
//! 4. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{CONFIG_PATH_VAR, apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum accepted config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// A loaded configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Dotted field path to the layer that set it.
    pub field_sources: FieldSources,
    /// Config files that were read.
    pub loaded_files: Vec<PathBuf>,
}

/// Load configuration from the process environment.
///
/// `config_path` takes precedence over `TESSERA_CONFIG`. A named file that
/// does not exist is an error; with no file named, only defaults and the
/// environment apply.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is unreadable or malformed, an
/// environment variable does not parse, or validation fails.
pub fn load(config_path: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    load_with_env(config_path, &collect_env_vars())
}

/// Load configuration against an explicit environment map.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    config_path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    let file = config_path
        .map(Path::to_path_buf)
        .or_else(|| env_vars.get(CONFIG_PATH_VAR).map(PathBuf::from));
    if let Some(path) = file {
        let overlay = read_file(&path)?;
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            ConfigLayer::File,
            &mut field_sources,
        );
        info!(path = %path.display(), "loaded config file");
        loaded_files.push(path);
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Read and parse one config file.
fn read_file(path: &Path) -> ConfigResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("tessera.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_only() {
        let resolved = load_with_env(None, &no_env()).unwrap();
        assert_eq!(resolved.config.keys.secret_path, "keys/secret.key");
        assert_eq!(resolved.config.tokens.ttl_secs, 600);
        assert_eq!(resolved.config.directory.timeout_ms, 5000);
        assert!(resolved.config.directory.url.is_none());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.field_sources.get("tokens.ttl_secs"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[tokens]\nttl_secs = 60\n\n[directory]\nurl = \"https://dir.example\"\n",
        );

        let resolved = load_with_env(Some(&path), &no_env()).unwrap();
        assert_eq!(resolved.config.tokens.ttl_secs, 60);
        assert_eq!(
            resolved.config.directory.url.as_deref(),
            Some("https://dir.example")
        );
        assert_eq!(resolved.config.keys.encoding, "seed");
        assert_eq!(resolved.loaded_files, vec![path]);
    }

    #[test]
    fn test_env_is_fallback_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[tokens]\nttl_secs = 60\n");
        let env: HashMap<String, String> = [
            ("TESSERA_TOKEN_TTL_SECS", "900"),
            ("TESSERA_KEY_ENCODING", "expanded"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let resolved = load_with_env(Some(&path), &env).unwrap();
        assert_eq!(resolved.config.tokens.ttl_secs, 60, "file wins");
        assert_eq!(resolved.config.keys.encoding, "expanded", "env fills the gap");
        assert_eq!(
            resolved.field_sources.get("keys.encoding"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_config_path_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[logging]\nformat = \"json\"\n");
        let env: HashMap<String, String> =
            [(CONFIG_PATH_VAR.to_owned(), path.display().to_string())]
                .into_iter()
                .collect();

        let resolved = load_with_env(None, &env).unwrap();
        assert_eq!(resolved.config.logging.format, "json");
    }

    #[test]
    fn test_named_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = load_with_env(Some(&missing), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[tokens\nttl_secs = ");
        let err = load_with_env(Some(&path), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_wrong_type_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[tokens]\nttl_secs = \"ten\"\n");
        let err = load_with_env(Some(&path), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { ref path, .. } if path == "<merged config>"));
    }

    #[test]
    fn test_validation_runs_after_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[directory]\ntimeout_ms = 0\n");
        let err = load_with_env(Some(&path), &no_env()).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "directory.timeout_ms")
        );
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        let path = write_config(&dir, &data);
        let err = load_with_env(Some(&path), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
