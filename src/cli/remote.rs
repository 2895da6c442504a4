use colored::Colorize;

use crate::cli::open_store;
use crate::error::{CashbookError, Result};
use crate::fmt::number;
use crate::settings::{self, load_settings, remote_credentials, CredentialSource};

/// Pull every transaction from the remote into the local cache.
pub fn sync() -> Result<()> {
    let settings = load_settings();
    let mut store = open_store(&settings, false)?;
    let Some(backend) = store.backend_description() else {
        return Err(CashbookError::NotConfigured);
    };
    if store.refresh() {
        println!(
            "Synced {} transactions from {backend}",
            number(store.transactions().len())
        );
        Ok(())
    } else {
        Err(CashbookError::Other(
            store.last_error().unwrap_or("remote unavailable").to_string(),
        ))
    }
}

pub fn set(url: &str, key: &str) -> Result<()> {
    settings::save_credentials(url, key)?;
    println!("Saved remote credentials for {}", url.trim().trim_end_matches('/'));
    if std::env::var_os(settings::REMOTE_URL_ENV).is_some() {
        println!(
            "{} {} is set and takes priority over the settings file.",
            "Note:".yellow().bold(),
            settings::REMOTE_URL_ENV
        );
    }
    Ok(())
}

pub fn clear() -> Result<()> {
    settings::clear_credentials()?;
    println!("Removed saved remote credentials.");
    Ok(())
}

pub fn show() -> Result<()> {
    let settings = load_settings();
    let Some(creds) = remote_credentials(&settings) else {
        println!("Remote:  {}", "not configured (local cache only)".dimmed());
        println!("Set one with `cashbook remote set --url <URL> --key <KEY>`.");
        return Ok(());
    };
    let source = match creds.source {
        CredentialSource::Environment => "environment",
        CredentialSource::SettingsFile => "settings file",
    };
    println!("URL:     {}", creds.url);
    println!("Key:     {}", creds.masked_key());
    println!("Source:  {source}");

    let mut store = open_store(&settings, false)?;
    if store.refresh() {
        println!(
            "Status:  {} ({} transactions)",
            "online".green().bold(),
            number(store.transactions().len())
        );
    } else {
        println!(
            "Status:  {} {}",
            "offline".red().bold(),
            store.last_error().unwrap_or("")
        );
    }
    Ok(())
}
