//! Configuration management for the lyrics downloader.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage the library
//! location, provider priorities and the quality policies applied to downloaded
//! lyrics.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Command line flags (highest priority, applied by the CLI layer)
//! 2. Environment variables
//! 3. `.env` file in the local data directory
//! 4. Application defaults

use std::{env, path::PathBuf, str::FromStr};

use crate::{
    error::{LyricsError, Result},
    fetch::BatchOptions,
    lyrics::{
        Validators,
        validate::{DEFAULT_REJECT_RATIO, clamp_reject_ratio},
    },
    providers::{DEFAULT_SYNCEDLYRICS_BIN, ProviderResolver},
    types::{Provider, UpgradePolicy},
};

pub const APP_DIR: &str = "lyricsync";

pub const ENV_MUSIC_DIR: &str = "LYRICSYNC_MUSIC_DIR";
pub const ENV_PROVIDERS_ORDER: &str = "LYRICSYNC_PROVIDERS_ORDER";
pub const ENV_PROVIDERS_ENABLED: &str = "LYRICSYNC_PROVIDERS_ENABLED";
pub const ENV_LANG: &str = "LYRICSYNC_LANG";
pub const ENV_ALLOW_PLAIN_FALLBACK: &str = "LYRICSYNC_ALLOW_PLAIN_FALLBACK";
pub const ENV_UPGRADE_PLAIN: &str = "LYRICSYNC_UPGRADE_PLAIN";
pub const ENV_RENAME_PLAIN: &str = "LYRICSYNC_RENAME_PLAIN";
pub const ENV_STRIP_CJK: &str = "LYRICSYNC_STRIP_CJK";
pub const ENV_REJECT_NON_ASCII: &str = "LYRICSYNC_REJECT_NON_ASCII";
pub const ENV_REJECT_NON_ASCII_RATIO: &str = "LYRICSYNC_REJECT_NON_ASCII_RATIO";
pub const ENV_SYNCEDLYRICS_BIN: &str = "LYRICSYNC_SYNCEDLYRICS_BIN";

/// Returns the platform-specific data directory of the application.
///
/// - Linux: `~/.local/share/lyricsync`
/// - macOS: `~/Library/Application Support/lyricsync`
/// - Windows: `%LOCALAPPDATA%/lyricsync`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// environment variables from `lyricsync/.env` inside the platform-specific
/// local data directory. A missing `.env` file is not an error; variables
/// already present in the environment are never overridden.
///
/// # Errors
///
/// This function will return an error if:
/// - The parent directory cannot be created
/// - The `.env` file exists but cannot be parsed
///
/// # Example
///
/// ```
/// use lyricsync::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> std::result::Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path)
        .map(|_| ())
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))
}

/// Settings read by the download pipeline.
///
/// A snapshot is taken when a batch starts; changes made afterwards only
/// affect the next batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub music_dir: Option<PathBuf>,
    pub providers_order: Vec<Provider>,
    pub providers_enabled: Vec<Provider>,
    pub lang: Option<String>,
    pub allow_plain_fallback: bool,
    pub upgrade_plain: UpgradePolicy,
    pub rename_plain: bool,
    pub strip_cjk: bool,
    pub reject_non_ascii: bool,
    pub reject_non_ascii_ratio: f64,
    pub syncedlyrics_bin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_dir: None,
            providers_order: Provider::ALL.to_vec(),
            providers_enabled: Provider::ALL
                .into_iter()
                .filter(|p| *p != Provider::Genius)
                .collect(),
            lang: Some("en".to_string()),
            allow_plain_fallback: false,
            upgrade_plain: UpgradePolicy::Ask,
            rename_plain: false,
            strip_cjk: true,
            reject_non_ascii: true,
            reject_non_ascii_ratio: DEFAULT_REJECT_RATIO,
            syncedlyrics_bin: DEFAULT_SYNCEDLYRICS_BIN.to_string(),
        }
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> LyricsError {
    LyricsError::InvalidSetting {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(name, format!("expected a boolean, got '{}'", other))),
    }
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

/// Parses a comma separated provider list such as `Lrclib,NetEase`.
pub fn parse_providers(name: &str, value: &str) -> Result<Vec<Provider>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Provider::from_str(s).map_err(|e| invalid(name, e)))
        .collect()
}

impl Settings {
    /// Builds settings from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(dir) = lookup(ENV_MUSIC_DIR).filter(|d| !d.trim().is_empty()) {
            settings.music_dir = Some(expand_home(dir.trim()));
        }
        if let Some(order) = lookup(ENV_PROVIDERS_ORDER) {
            settings.providers_order = parse_providers(ENV_PROVIDERS_ORDER, &order)?;
        }
        if let Some(enabled) = lookup(ENV_PROVIDERS_ENABLED) {
            settings.providers_enabled = parse_providers(ENV_PROVIDERS_ENABLED, &enabled)?;
        }
        if let Some(lang) = lookup(ENV_LANG) {
            let lang = lang.trim().to_string();
            settings.lang = (!lang.is_empty()).then_some(lang);
        }
        if let Some(v) = lookup(ENV_ALLOW_PLAIN_FALLBACK) {
            settings.allow_plain_fallback = parse_bool(ENV_ALLOW_PLAIN_FALLBACK, &v)?;
        }
        if let Some(v) = lookup(ENV_UPGRADE_PLAIN) {
            settings.upgrade_plain =
                UpgradePolicy::from_str(&v).map_err(|e| invalid(ENV_UPGRADE_PLAIN, e))?;
        }
        if let Some(v) = lookup(ENV_RENAME_PLAIN) {
            settings.rename_plain = parse_bool(ENV_RENAME_PLAIN, &v)?;
        }
        if let Some(v) = lookup(ENV_STRIP_CJK) {
            settings.strip_cjk = parse_bool(ENV_STRIP_CJK, &v)?;
        }
        if let Some(v) = lookup(ENV_REJECT_NON_ASCII) {
            settings.reject_non_ascii = parse_bool(ENV_REJECT_NON_ASCII, &v)?;
        }
        if let Some(v) = lookup(ENV_REJECT_NON_ASCII_RATIO) {
            let ratio: f64 = v.trim().parse().map_err(|_| {
                invalid(ENV_REJECT_NON_ASCII_RATIO, format!("'{}' is not a number", v))
            })?;
            settings.reject_non_ascii_ratio = clamp_reject_ratio(ratio);
        }
        if let Some(bin) = lookup(ENV_SYNCEDLYRICS_BIN).filter(|b| !b.trim().is_empty()) {
            settings.syncedlyrics_bin = bin.trim().to_string();
        }

        Ok(settings)
    }

    pub fn resolver(&self) -> ProviderResolver {
        ProviderResolver::new(
            self.providers_order.clone(),
            self.providers_enabled.iter().copied(),
        )
    }

    pub fn validators(&self) -> Validators {
        Validators {
            strip_cjk: self.strip_cjk,
            reject_ratio: self
                .reject_non_ascii
                .then(|| clamp_reject_ratio(self.reject_non_ascii_ratio)),
            rename_plain: self.rename_plain,
        }
    }

    /// Snapshot of everything a batch needs.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            resolver: self.resolver(),
            lang: self.lang.clone(),
            allow_plain_fallback: self.allow_plain_fallback,
            upgrade: self.upgrade_plain,
            validators: self.validators(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.providers_enabled.contains(&Provider::Genius));
        assert_eq!(settings.upgrade_plain, UpgradePolicy::Ask);
        assert_eq!(settings.reject_non_ascii_ratio, 0.15);
    }

    #[test]
    fn reads_every_variable() {
        let settings = settings_from(&[
            (ENV_MUSIC_DIR, "/music"),
            (ENV_PROVIDERS_ORDER, "NetEase, lrclib"),
            (ENV_PROVIDERS_ENABLED, "NetEase"),
            (ENV_LANG, ""),
            (ENV_ALLOW_PLAIN_FALLBACK, "yes"),
            (ENV_UPGRADE_PLAIN, "auto"),
            (ENV_RENAME_PLAIN, "1"),
            (ENV_STRIP_CJK, "false"),
            (ENV_REJECT_NON_ASCII, "off"),
            (ENV_REJECT_NON_ASCII_RATIO, "0.9"),
            (ENV_SYNCEDLYRICS_BIN, "/opt/bin/syncedlyrics"),
        ])
        .unwrap();

        assert_eq!(settings.music_dir, Some(PathBuf::from("/music")));
        assert_eq!(
            settings.providers_order,
            vec![Provider::NetEase, Provider::Lrclib]
        );
        assert_eq!(settings.providers_enabled, vec![Provider::NetEase]);
        assert_eq!(settings.lang, None);
        assert!(settings.allow_plain_fallback);
        assert_eq!(settings.upgrade_plain, UpgradePolicy::Auto);
        assert!(settings.rename_plain);
        assert!(!settings.strip_cjk);
        assert!(!settings.reject_non_ascii);
        assert_eq!(settings.reject_non_ascii_ratio, 0.5);
        assert_eq!(settings.syncedlyrics_bin, "/opt/bin/syncedlyrics");
        assert_eq!(settings.validators().reject_ratio, None);
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = settings_from(&[(ENV_PROVIDERS_ORDER, "Lrclib,Tidal")]).unwrap_err();
        assert!(err.to_string().contains(ENV_PROVIDERS_ORDER));
    }

    #[test]
    fn expands_home_prefix() {
        let home = dirs::home_dir().unwrap_or_default();
        if !home.as_os_str().is_empty() {
            assert_eq!(expand_home("~/Music"), home.join("Music"));
        }
        assert_eq!(expand_home("/srv/music"), PathBuf::from("/srv/music"));
        assert_eq!(expand_home("~user/music"), PathBuf::from("~user/music"));
    }

    #[test]
    fn rejects_bad_boolean() {
        assert!(settings_from(&[(ENV_STRIP_CJK, "maybe")]).is_err());
    }
}
