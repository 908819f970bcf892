use std::path::PathBuf;
use std::sync::LazyLock;

use axum_extra::extract::cookie::Key;
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Runtime configuration, merged from defaults and `PLOTDECK_`-prefixed
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub results_dir: PathBuf,
    pub loglevel: String,
    /// Secret used to derive the private-cookie key. Must be at least 32
    /// bytes; an empty value generates an ephemeral key at startup.
    pub cookie_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:plotdeck.sqlite".to_string(),
            bind_addr: "0.0.0.0:8000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            results_dir: PathBuf::from("plots"),
            loglevel: "info".to_string(),
            cookie_secret: String::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("PLOTDECK_"))
            .extract()
    }

    /// Derive the private-cookie key from the configured secret.
    /// Falls back to a fresh random key when the secret is missing or too
    /// short; sessions then do not survive a restart.
    pub fn cookie_key(&self) -> Key {
        if self.cookie_secret.len() >= 32 {
            Key::derive_from(self.cookie_secret.as_bytes())
        } else {
            if !self.cookie_secret.is_empty() {
                warn!("cookie_secret shorter than 32 bytes; using an ephemeral key");
            }
            Key::generate()
        }
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| {
        eprintln!("invalid configuration: {e}");
        std::process::exit(1);
    })
});
