//! Configuration module.
//!
//! Provides the root [`Config`] struct with compiled-in defaults, a loader
//! that merges JSON config files and `QUIPWITS__*` environment overrides,
//! and the credential store for the optional remote prompt generator.

pub mod credentials;
pub mod game;
pub mod loader;
pub mod logging;

pub use credentials::CredentialStore;
pub use game::{GameRules, ServerTuning};
pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listening port; the `PORT` environment variable overrides this
    pub port: u16,
    /// Comma-separated allowed origins, or "*" for permissive CORS
    pub cors_origins: String,
    /// Directory holding the host and player static UIs
    pub static_dir: String,
    pub server: ServerTuning,
    pub game: GameRules,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_origins: "*".to_string(),
            static_dir: "public".to_string(),
            server: ServerTuning::default(),
            game: GameRules::default(),
            logging: LoggingConfig::default(),
        }
    }
}
