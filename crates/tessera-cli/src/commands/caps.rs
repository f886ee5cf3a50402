//! Caps command: inspect capability masks.

use anyhow::{Context, Result};
use tessera_config::Config;
use tessera_permissions::{
    CAPABILITY_TABLE, Capabilities, PrincipalId, mask_satisfies, render, render_keys,
};

use crate::config_bridge;
use crate::theme::Theme;

/// Print every defined capability.
pub(crate) fn list() {
    println!("\n{}", Theme::header("Capabilities"));
    for def in CAPABILITY_TABLE {
        println!(
            "  {:>3}  {:<28}{}",
            def.flag.bits().trailing_zeros(),
            def.key,
            Theme::dimmed(def.label)
        );
    }
    println!();
}

/// Print the labels held by `mask`.
pub(crate) fn render_mask(mask: &str, keys: bool) -> Result<()> {
    let mask = Capabilities::parse_mask(mask)?;
    let names = if keys { render_keys(mask) } else { render(mask) };

    if names.is_empty() {
        println!("{}", Theme::dimmed("(none)"));
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Print whether `mask` grants `key`. Returns the decision.
pub(crate) fn check(mask: &str, key: &str) -> Result<bool> {
    let mask = Capabilities::parse_mask(mask)?;
    let required = Capabilities::from_keys([key])?;

    let allowed = mask_satisfies(mask, required);
    if allowed {
        println!("{}", Theme::success("allowed"));
    } else {
        println!("{}", Theme::error("denied"));
    }
    Ok(allowed)
}

/// Resolve `principal` against the configured role directory and print
/// their effective capabilities.
pub(crate) async fn resolve(config: &Config, principal: &str) -> Result<()> {
    let Some(evaluator) = config_bridge::to_evaluator(config)? else {
        anyhow::bail!("no role directory configured (set directory.url or TESSERA_DIRECTORY_URL)");
    };

    let principal = PrincipalId::new(principal);
    let mask = evaluator
        .effective_mask(Some(&principal))
        .await
        .context("role lookup failed")?;

    println!("\n{}", Theme::header(&format!("Effective capabilities of {principal}")));
    println!("{}", Theme::row("Mask", format!("{} (0x{:x})", mask.bits(), mask.bits())));
    for label in render(mask) {
        println!("  - {label}");
    }
    println!();
    Ok(())
}
