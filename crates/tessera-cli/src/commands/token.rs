//! Token command: mint and verify signed tokens.

use anyhow::{Context, Result};
use tessera_config::Config;
use tessera_token::TokenMode;

use crate::config_bridge;
use crate::theme::Theme;

fn mode(expiring: bool) -> TokenMode {
    if expiring {
        TokenMode::Expiring
    } else {
        TokenMode::Plain
    }
}

/// Print a token for `subject`.
pub(crate) fn mint(config: &Config, subject: &str, expiring: bool) -> Result<()> {
    let service = config_bridge::to_token_service(config)?;
    let token = service
        .mint(subject, mode(expiring))
        .context("failed to mint token")?;
    println!("{token}");
    Ok(())
}

/// Print the subject of `token`. Returns `false` if it does not verify.
pub(crate) fn verify(config: &Config, token: &str, expiring: bool) -> Result<bool> {
    let service = config_bridge::to_token_service(config)?;
    match service.verify(token, mode(expiring)) {
        Some(subject) => {
            println!("{subject}");
            Ok(true)
        },
        None => {
            eprintln!("{}", Theme::error("invalid token"));
            Ok(false)
        },
    }
}
