//! Deep merge of TOML trees with per-field source tracking.
//!
//! Merging raw [`toml::Value`] trees keeps "absent" distinct from "default":
//! a key missing from a file never overrides the layer below.

use std::collections::HashMap;

/// Which layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Embedded `defaults.toml`.
    Defaults,
    /// The config file given by `--config` or `TESSERA_CONFIG`.
    File,
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::File => write!(f, "config file"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Dotted field path to the layer that set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// Tables merge per key; scalars and arrays replace.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            record_leaves(overlay, prefix, layer, sources);
        },
    }
}

/// Record every leaf under `val` as set by `layer`.
pub fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer);
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_only_present_keys() {
        let mut base = parse("[keys]\nsecret_path = \"a\"\npublic_path = \"b\"\n");
        let mut sources = FieldSources::new();
        record_leaves(&base, "", ConfigLayer::Defaults, &mut sources);

        let overlay = parse("[keys]\nsecret_path = \"override\"\n");
        deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::File, &mut sources);

        assert_eq!(base["keys"]["secret_path"].as_str(), Some("override"));
        assert_eq!(base["keys"]["public_path"].as_str(), Some("b"));
        assert_eq!(sources.get("keys.secret_path"), Some(&ConfigLayer::File));
        assert_eq!(sources.get("keys.public_path"), Some(&ConfigLayer::Defaults));
    }

    #[test]
    fn test_new_tables_are_recorded() {
        let mut base = parse("[tokens]\nttl_secs = 600\n");
        let mut sources = FieldSources::new();
        let overlay = parse("[directory]\nurl = \"https://d\"\ntimeout_ms = 10\n");
        deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::File, &mut sources);

        assert_eq!(sources.get("directory.url"), Some(&ConfigLayer::File));
        assert_eq!(sources.get("directory.timeout_ms"), Some(&ConfigLayer::File));
        assert!(!sources.contains_key("tokens.ttl_secs"));
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = parse("[logging]\ndirectives = [\"a=debug\", \"b=warn\"]\n");
        let overlay = parse("[logging]\ndirectives = [\"c=trace\"]\n");
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::File, &mut sources);
        assert_eq!(
            base["logging"]["directives"].as_array().map(Vec::len),
            Some(1)
        );
    }
}
