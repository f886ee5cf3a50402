#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for Tessera.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tessera_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("secret key at {}", resolved.config.keys.secret_path);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest:
//!
//! 1. **Config file** named by `--config` or `TESSERA_CONFIG`
//! 2. **Environment variables** (`TESSERA_*`), fallback only
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! # Design
//!
//! This crate depends on no other Tessera crate. Conversion into domain
//! types happens where the configuration is consumed.

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// File loading.
pub mod loader;
/// TOML tree merging.
pub mod merge;
/// Configuration structs.
pub mod types;
/// Validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use merge::ConfigLayer;
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is malformed or the result
    /// fails validation.
    pub fn load(config_path: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(config_path)
    }
}
