//! Centralized error types for mailbridge using thiserror.

use thiserror::Error;

/// Errors related to dispatcher configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("invalid template '{name}': {message}")]
    InvalidTemplate { name: String, message: String },
}

/// Errors raised while finalizing a message from caller-supplied fields.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("message has neither a text nor an html body")]
    MissingBody,
    #[error("message has no recipient")]
    MissingRecipient,
}

/// Errors related to template rendering.
///
/// Rendering is strict: a template that references a field missing from
/// its context fails instead of producing partial output.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template render failed: {message}")]
    RenderFailed { message: String },
}

/// A non-success response from the mail provider.
///
/// Carries the request method and URL, the response status code, and the
/// response body verbatim. The display form is rendered through the
/// configured API-error template at the time of failure.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct DeliveryError {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: String,
    message: String,
}

impl DeliveryError {
    pub(crate) fn new(
        method: String,
        url: String,
        status: u16,
        body: String,
        message: String,
    ) -> Self {
        Self {
            method,
            url,
            status,
            body,
            message,
        }
    }
}

/// The composite error surfaced by a send call.
///
/// Transport-level network failures are not reclassified; they pass
/// through as the underlying `reqwest::Error`.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid message: {0}")]
    Build(#[from] BuildError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("delivery rejected: {0}")]
    Delivery(#[from] DeliveryError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
