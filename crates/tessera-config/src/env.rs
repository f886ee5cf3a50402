//! Environment variable fallbacks.
//!
//! Environment variables are a fallback, not an override: one only applies
//! when no config file set the field.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Environment variable that names the config file.
pub const CONFIG_PATH_VAR: &str = "TESSERA_CONFIG";

/// TOML type a field expects.
#[derive(Clone, Copy)]
enum FieldKind {
    Text,
    Integer,
    Boolean,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "TESSERA_SECRET_KEY_PATH",
        field_path: "keys.secret_path",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "TESSERA_PUBLIC_KEY_PATH",
        field_path: "keys.public_path",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "TESSERA_KEY_ENCODING",
        field_path: "keys.encoding",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "TESSERA_KEY_AUTO_GENERATE",
        field_path: "keys.auto_generate",
        kind: FieldKind::Boolean,
    },
    EnvMapping {
        var_name: "TESSERA_TOKEN_TTL_SECS",
        field_path: "tokens.ttl_secs",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "TESSERA_DIRECTORY_URL",
        field_path: "directory.url",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "TESSERA_DIRECTORY_TOKEN",
        field_path: "directory.token",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "TESSERA_DIRECTORY_TIMEOUT_MS",
        field_path: "directory.timeout_ms",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "TESSERA_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::Text,
    },
    EnvMapping {
        var_name: "TESSERA_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::Text,
    },
];

/// Apply environment fallbacks to fields no config file set.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] if a numeric or boolean variable
/// does not parse.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults)
        {
            continue;
        }

        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );

        let value = coerce(mapping, raw)?;
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

/// Collect the process environment into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let trimmed = raw.trim();
    let invalid = |expected: &str| ConfigError::ValidationError {
        field: mapping.field_path.to_owned(),
        message: format!("{} must be {expected}, got '{raw}'", mapping.var_name),
    };

    match mapping.kind {
        FieldKind::Text => Ok(toml::Value::String(trimmed.to_owned())),
        FieldKind::Integer => trimmed
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|_| invalid("an integer")),
        FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Ok(toml::Value::Boolean(false)),
            _ => Err(invalid("a boolean")),
        },
    }
}

/// Set `section.field` in the tree, creating the section table if needed.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let Some((section, field)) = path.split_once('.') else {
        return;
    };
    let Some(root) = root.as_table_mut() else {
        return;
    };
    let table = root
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = table.as_table_mut() {
        table.insert(field.to_owned(), value);
    }
}
