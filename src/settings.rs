use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CashbookError, Result};

pub const HOME_ENV: &str = "CASHBOOK_HOME";
pub const REMOTE_URL_ENV: &str = "CASHBOOK_REMOTE_URL";
pub const REMOTE_KEY_ENV: &str = "CASHBOOK_REMOTE_KEY";

const DEFAULT_COMPANY: &str = "SR INFOTECH";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default)]
    pub remote_url: String,
    #[serde(default)]
    pub remote_key: String,
}

fn default_company_name() -> String {
    DEFAULT_COMPANY.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            company_name: default_company_name(),
            remote_url: String::new(),
            remote_key: String::new(),
        }
    }
}

/// Where the settings file lives. `CASHBOOK_HOME` replaces ~/.config/cashbook.
fn config_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cashbook")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join("data");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("cashbook")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("ignoring unreadable settings file {}: {e}", path.display());
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CashbookError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn db_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("cashbook.db")
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

// ---------------------------------------------------------------------------
// Remote credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    SettingsFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub url: String,
    pub key: String,
    pub source: CredentialSource,
}

impl RemoteCredentials {
    /// The key with everything but the last four characters hidden.
    pub fn masked_key(&self) -> String {
        let n = self.key.chars().count();
        if n <= 4 {
            return "*".repeat(n);
        }
        let tail: String = self.key.chars().skip(n - 4).collect();
        format!("{}{tail}", "*".repeat(n - 4))
    }
}

/// Empty values and the template placeholders count as unset.
pub fn is_configured(url: &str, key: &str) -> bool {
    let url = url.trim();
    let key = key.trim();
    !url.is_empty()
        && !key.is_empty()
        && !url.contains("your-project")
        && !key.contains("your-anon-key")
}

/// Environment wins over the settings file; either must be complete on its own.
pub fn resolve_credentials(
    settings: &Settings,
    env_url: Option<String>,
    env_key: Option<String>,
) -> Option<RemoteCredentials> {
    if let (Some(url), Some(key)) = (env_url, env_key) {
        if is_configured(&url, &key) {
            return Some(RemoteCredentials {
                url: url.trim().to_string(),
                key: key.trim().to_string(),
                source: CredentialSource::Environment,
            });
        }
    }
    if is_configured(&settings.remote_url, &settings.remote_key) {
        return Some(RemoteCredentials {
            url: settings.remote_url.trim().to_string(),
            key: settings.remote_key.trim().to_string(),
            source: CredentialSource::SettingsFile,
        });
    }
    None
}

pub fn remote_credentials(settings: &Settings) -> Option<RemoteCredentials> {
    resolve_credentials(
        settings,
        std::env::var(REMOTE_URL_ENV).ok(),
        std::env::var(REMOTE_KEY_ENV).ok(),
    )
}

pub fn save_credentials(url: &str, key: &str) -> Result<()> {
    if !is_configured(url, key) {
        return Err(CashbookError::Settings(
            "both a real URL and key are required".to_string(),
        ));
    }
    let mut settings = load_settings();
    settings.remote_url = url.trim().trim_end_matches('/').to_string();
    settings.remote_key = key.trim().to_string();
    save_settings(&settings)
}

pub fn clear_credentials() -> Result<()> {
    let mut settings = load_settings();
    settings.remote_url.clear();
    settings.remote_key.clear();
    save_settings(&settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_remote(url: &str, key: &str) -> Settings {
        Settings {
            remote_url: url.to_string(),
            remote_key: key.to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            company_name: "Acme Traders".to_string(),
            remote_url: "https://abc.example.co".to_string(),
            remote_key: "k".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.company_name, "Acme Traders");
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.remote_url, "https://abc.example.co");
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.company_name, "SR INFOTECH");
        assert!(s.remote_url.is_empty());
        assert!(s.remote_key.is_empty());
    }

    #[test]
    fn test_placeholders_are_not_configured() {
        assert!(!is_configured("", "key"));
        assert!(!is_configured("https://x.supabase.co", "  "));
        assert!(!is_configured("https://your-project.supabase.co", "abc"));
        assert!(!is_configured("https://x.supabase.co", "your-anon-key"));
        assert!(is_configured("https://x.supabase.co", "abc"));
    }

    #[test]
    fn test_environment_takes_priority() {
        let settings = with_remote("https://file.example.co", "file-key");
        let creds = resolve_credentials(
            &settings,
            Some("https://env.example.co".to_string()),
            Some("env-key".to_string()),
        )
        .unwrap();
        assert_eq!(creds.url, "https://env.example.co");
        assert_eq!(creds.source, CredentialSource::Environment);
    }

    #[test]
    fn test_partial_environment_falls_back_to_file() {
        let settings = with_remote("https://file.example.co", "file-key");
        let creds =
            resolve_credentials(&settings, Some("https://env.example.co".to_string()), None)
                .unwrap();
        assert_eq!(creds.source, CredentialSource::SettingsFile);
        assert_eq!(creds.key, "file-key");
    }

    #[test]
    fn test_nothing_configured() {
        assert!(resolve_credentials(&Settings::default(), None, None).is_none());
        let placeholder = with_remote("https://your-project.supabase.co", "your-anon-key");
        assert!(resolve_credentials(&placeholder, None, None).is_none());
    }

    #[test]
    fn test_masked_key() {
        let creds = RemoteCredentials {
            url: "u".to_string(),
            key: "abcdefgh".to_string(),
            source: CredentialSource::SettingsFile,
        };
        assert_eq!(creds.masked_key(), "****efgh");
    }
}
