//! Configuration Module
//!
//! Handles loading and managing worker configuration from environment variables.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Scope the worker controls when `SCOPE_URL` is unset or invalid.
pub const DEFAULT_SCOPE: &str = "http://localhost:8080/";

/// How push message payloads are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushPayloadFormat {
    /// `{"title": .., "body": .., "url": ..}`
    Json,
    /// The whole payload is the notification body
    Text,
}

impl FromStr for PushPayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown push payload format: {}", other)),
        }
    }
}

/// The two shipped worker configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Lenient install, JSON push payloads, waits for old clients
    Game,
    /// Fresh install fetches, immediate takeover, text push payloads
    Horror,
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "game" => Ok(Self::Game),
            "horror" => Ok(Self::Horror),
            other => Err(format!("unknown worker variant: {}", other)),
        }
    }
}

/// Worker configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the current cache store; change it to rotate the cache
    pub cache_name: String,
    /// URLs pre-cached at install time, relative to `scope` or absolute
    pub manifest: Vec<String>,
    /// Origin and base path the worker controls
    pub scope: Url,
    /// Cached document served to navigations when the network is down
    pub offline_fallback: String,
    /// Background sync tag that triggers the sync routine
    pub sync_tag: String,
    /// Bypass intermediate HTTP caches when fetching the manifest
    pub force_reload_on_install: bool,
    /// Take control immediately instead of waiting for old clients to close
    pub skip_waiting_on_install: bool,
    /// Log manifest fetch failures instead of failing install
    pub swallow_install_errors: bool,
    /// Push payload interpretation
    pub push_payload_format: PushPayloadFormat,
    /// HTTP server port
    pub server_port: u16,
    /// Background sync task interval in seconds
    pub sync_interval: u64,
    /// Attempts before a sync registration is dropped
    pub max_sync_attempts: u32,
}

impl Config {
    /// Creates a config with the variant's behaviour flags and cache name.
    pub fn for_variant(variant: Variant) -> Self {
        let base = Self {
            cache_name: "synapse-game-v1.0.0".to_string(),
            manifest: default_manifest(),
            scope: default_scope(),
            offline_fallback: "./index.html".to_string(),
            sync_tag: "background-sync".to_string(),
            force_reload_on_install: false,
            skip_waiting_on_install: false,
            swallow_install_errors: true,
            push_payload_format: PushPayloadFormat::Json,
            server_port: 3000,
            sync_interval: 30,
            max_sync_attempts: 3,
        };

        match variant {
            Variant::Game => base,
            Variant::Horror => Self {
                cache_name: "synapse-horror-v1.0.0".to_string(),
                force_reload_on_install: true,
                skip_waiting_on_install: true,
                swallow_install_errors: false,
                push_payload_format: PushPayloadFormat::Text,
                ..base
            },
        }
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// `WORKER_VARIANT` selects the preset (default: `game`); every other
    /// variable overrides a single field of that preset.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Current cache store name
    /// - `MANIFEST` - Comma-separated pre-cache URLs
    /// - `SCOPE_URL` - Controlled origin (default: http://localhost:8080/)
    /// - `OFFLINE_FALLBACK` - Offline navigation document (default: ./index.html)
    /// - `SYNC_TAG` - Background sync tag (default: background-sync)
    /// - `FORCE_RELOAD_ON_INSTALL`, `SKIP_WAITING_ON_INSTALL`,
    ///   `SWALLOW_INSTALL_ERRORS` - Booleans
    /// - `PUSH_PAYLOAD_FORMAT` - `json` or `text`
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SYNC_INTERVAL` - Sync task frequency in seconds (default: 30)
    /// - `MAX_SYNC_ATTEMPTS` - Sync attempts before giving up (default: 3)
    pub fn from_env() -> Self {
        let variant = parse_var("WORKER_VARIANT").unwrap_or(Variant::Game);
        let defaults = Self::for_variant(variant);

        Self {
            cache_name: env::var("CACHE_NAME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.cache_name),
            manifest: env::var("MANIFEST")
                .ok()
                .map(|v| parse_manifest(&v))
                .unwrap_or(defaults.manifest),
            scope: env::var("SCOPE_URL")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.scope),
            offline_fallback: env::var("OFFLINE_FALLBACK")
                .unwrap_or(defaults.offline_fallback),
            sync_tag: env::var("SYNC_TAG").unwrap_or(defaults.sync_tag),
            force_reload_on_install: parse_var("FORCE_RELOAD_ON_INSTALL")
                .unwrap_or(defaults.force_reload_on_install),
            skip_waiting_on_install: parse_var("SKIP_WAITING_ON_INSTALL")
                .unwrap_or(defaults.skip_waiting_on_install),
            swallow_install_errors: parse_var("SWALLOW_INSTALL_ERRORS")
                .unwrap_or(defaults.swallow_install_errors),
            push_payload_format: parse_var("PUSH_PAYLOAD_FORMAT")
                .unwrap_or(defaults.push_payload_format),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            sync_interval: parse_var("SYNC_INTERVAL").unwrap_or(defaults.sync_interval),
            max_sync_attempts: parse_var("MAX_SYNC_ATTEMPTS")
                .unwrap_or(defaults.max_sync_attempts),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_variant(Variant::Game)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Splits a comma-separated manifest, dropping blank entries.
pub fn parse_manifest(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn default_manifest() -> Vec<String> {
    [
        "./",
        "./index.html",
        "./Icon.png",
        "./manifest.json",
        "https://cdn.tailwindcss.com",
        "https://fonts.googleapis.com/css2?family=Creepster&family=VT323&family=Space+Mono&family=Courier+Prime&display=swap",
        "https://cdnjs.cloudflare.com/ajax/libs/tone/14.7.77/Tone.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_scope() -> Url {
    Url::parse(DEFAULT_SCOPE).expect("DEFAULT_SCOPE is a valid URL")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_name, "synapse-game-v1.0.0");
        assert_eq!(config.manifest.len(), 7);
        assert_eq!(config.scope.as_str(), DEFAULT_SCOPE);
        assert_eq!(config.offline_fallback, "./index.html");
        assert_eq!(config.sync_tag, "background-sync");
        assert!(!config.force_reload_on_install);
        assert!(!config.skip_waiting_on_install);
        assert!(config.swallow_install_errors);
        assert_eq!(config.push_payload_format, PushPayloadFormat::Json);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_horror_variant() {
        let config = Config::for_variant(Variant::Horror);
        assert_eq!(config.cache_name, "synapse-horror-v1.0.0");
        assert!(config.force_reload_on_install);
        assert!(config.skip_waiting_on_install);
        assert!(!config.swallow_install_errors);
        assert_eq!(config.push_payload_format, PushPayloadFormat::Text);
        assert_eq!(config.manifest, Config::default().manifest);
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(" ./ , ./index.html,, https://cdn.example.com/a.js ");
        assert_eq!(
            manifest,
            vec!["./", "./index.html", "https://cdn.example.com/a.js"]
        );
        assert!(parse_manifest("").is_empty());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("JSON".parse::<PushPayloadFormat>(), Ok(PushPayloadFormat::Json));
        assert_eq!("text".parse::<PushPayloadFormat>(), Ok(PushPayloadFormat::Text));
        assert!("xml".parse::<PushPayloadFormat>().is_err());
        assert_eq!("Horror".parse::<Variant>(), Ok(Variant::Horror));
        assert!("arcade".parse::<Variant>().is_err());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "WORKER_VARIANT",
            "CACHE_NAME",
            "MANIFEST",
            "SCOPE_URL",
            "SERVER_PORT",
            "SYNC_INTERVAL",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.cache_name, "synapse-game-v1.0.0");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.sync_interval, 30);
    }
}
