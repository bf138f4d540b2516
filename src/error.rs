use std::path::PathBuf;
use thiserror::Error;

/// Failures of the persisted settings backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is not a string table: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Why a top-level navigation could not be completed by the probe surface.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("Could not connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Certificate rejected by policy: {0}")]
    CertificateRejected(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("HTTP {code} {reason}")]
    Http { code: u16, reason: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Errors of the out-of-band control channel.
#[derive(Error, Debug, PartialEq)]
pub enum ControlError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
}
