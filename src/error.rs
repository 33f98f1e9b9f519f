use std::io;
use thiserror::Error;

/// Everything that can stop a batch from reaching New Relic. A write either
/// delivers the whole batch or returns one of these.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("license key is a required field for the New Relic forwarder")]
    MissingLicense,

    #[error("invalid forwarder configuration: {0}")]
    Config(String),

    #[error("failed to resolve hostname: {0}")]
    Hostname(#[source] io::Error),

    #[error("unable to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("unable to encode request data: {0}")]
    Encode(String),

    #[error("error POSTing metrics: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("status {0}: agent may be out of date")]
    VersionMismatch(u16),

    #[error("authentication error (no license key header, or invalid license key)")]
    Authentication,

    #[error("request entity too large: too many metrics were sent in one request")]
    PayloadTooLarge,

    #[error("status {0}: New Relic API not available")]
    Unavailable(u16),

    #[error("received bad status code: {0}")]
    BadStatus(u16),

    #[error("received bad response data: {body} ({reason})")]
    BadResponse { body: String, reason: String },

    #[error("New Relic error: {0}")]
    Remote(String),

    #[error("New Relic status not ok: {0}")]
    StatusNotOk(String),
}

impl ForwardError {
    /// True for errors raised while connecting, before anything was sent.
    pub fn is_config(&self) -> bool {
        match *self {
            ForwardError::MissingLicense
            | ForwardError::Config(_)
            | ForwardError::Hostname(_)
            | ForwardError::Client(_) => true,
            _ => false,
        }
    }

    /// True when the endpoint answered with a non-success HTTP status.
    pub fn is_status(&self) -> bool {
        match *self {
            ForwardError::VersionMismatch(_)
            | ForwardError::Authentication
            | ForwardError::PayloadTooLarge
            | ForwardError::Unavailable(_)
            | ForwardError::BadStatus(_) => true,
            _ => false,
        }
    }
}
