//! Shared domain types, configuration, and the publisher seam for the fare
//! crawler workspace.

pub mod app_config;
pub mod company;
pub mod config;
pub mod offer;
pub mod publish;
pub mod routes;

use thiserror::Error;

pub use app_config::{AppConfig, LogFormat, SinkConfig};
pub use company::Company;
pub use config::{load_app_config, load_app_config_from_env};
pub use offer::CanonicalOffer;
pub use publish::{PublishError, Publisher};
pub use routes::{load_catalogs, Route, RouteCatalog};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read routes file {path}: {source}")]
    RoutesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse routes file: {0}")]
    RoutesFileParse(#[from] serde_yaml::Error),

    #[error("invalid station code \"{0}\": expected three ASCII letters")]
    InvalidStation(String),

    #[error("identical pair ({0},{0}) is not a route")]
    IdenticalPair(String),
}
