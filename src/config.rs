//! Configuration manager for the EuskalIA server.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_PORT: u16 = 5235;
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server configuration, read from `config.yaml`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of this API, used in emailed links.
    pub url: String,
    /// URL of the mobile/web client, used as redirect target after
    /// email verification and account deactivation.
    pub client_url: String,
    /// Listening port.
    pub port: Option<u16>,
    #[serde(default)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to SQLite configuration.
    #[serde(skip_serializing)]
    pub database: Option<Database>,
    /// Related to field encryption.
    #[serde(skip_serializing)]
    pub encryption: Option<Encryption>,
    /// Related to mail sending.
    #[serde(skip_serializing)]
    pub mail: Option<Mail>,
}

/// SQLite configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Database {
    /// Path to the SQLite database file.
    pub path: String,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Field encryption configuration.
///
/// The key used to live as a hardcoded constant next to the cipher; it is
/// now injected here (or through the `EUSKALIA_KEY` environment variable).
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Encryption {
    /// Symmetric key material, at least 32 bytes.
    pub key: Option<String>,
}

/// Mail configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Mail {
    /// Print emails to stdout instead of delivering them.
    pub mock: bool,
}

impl Default for Mail {
    fn default() -> Self {
        Self { mock: true }
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    /// Set the configuration file path.
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Listening port with fallback.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            return Ok(Arc::new(self.error(err)));
                        },
                    };

                // set app version.
                config.version = VERSION.to_owned();

                // normalize URLs.
                config.url = self.normalize_url(&config.url)?;
                config.client_url = self.normalize_url(&config.client_url)?;

                Ok(Arc::new(config))
            },
            Err(err) => Ok(Arc::new(self.error(err))),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found");
        Self {
            version: VERSION.to_owned(),
            ..Default::default()
        }
    }
}
