//! Keys command: provision and inspect the signing keypair.

use anyhow::{Context, Result};
use tessera_config::Config;
use tessera_crypto::{CryptoError, KeyPair, KeyStore};

use crate::config_bridge;
use crate::theme::Theme;

/// Create the keypair out of band, before any worker starts.
pub(crate) fn init_keys(config: &Config) -> Result<()> {
    let store = config_bridge::to_key_store(config)?;

    let key = match store.provision() {
        Ok(key) => key,
        Err(CryptoError::AlreadyProvisioned { path }) => {
            println!(
                "{}",
                Theme::error(&format!("A secret key already exists at {path}."))
            );
            println!(
                "{}",
                Theme::dimmed("Refusing to overwrite it: outstanding tokens would stop verifying.")
            );
            anyhow::bail!("keys already provisioned");
        },
        Err(e) => return Err(e).context("failed to provision keys"),
    };

    println!("{}", Theme::success("Keypair provisioned."));
    print_key(&key, &store);
    Ok(())
}

/// Show the current keypair without creating one.
pub(crate) fn show_keys(config: &Config) -> Result<()> {
    let store = config_bridge::to_key_store(config)?;

    if !store.exists() {
        println!(
            "{}",
            Theme::info("No keypair found. Run `tessera keys init` to create one.")
        );
        return Ok(());
    }

    let key = store
        .load()
        .with_context(|| format!("failed to load {}", store.secret_path().display()))?;

    println!("\n{}", Theme::header("Signing Key"));
    print_key(&key, &store);
    Ok(())
}

fn print_key(key: &KeyPair, store: &KeyStore) {
    println!("{}", Theme::row("Key ID", key.key_id_hex()));
    println!("{}", Theme::row("Public key", key.export_public_key()));
    println!("{}", Theme::row("Encoding", store.encoding()));
    println!("{}", Theme::row("Secret", store.secret_path().display()));
    println!("{}", Theme::row("Public", store.public_path().display()));
    println!();
}
