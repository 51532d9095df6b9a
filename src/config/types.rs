//! Configuration types for the mail dispatcher.

use serde::Deserialize;

use super::SecretString;

/// Whether a send performs real network I/O or only renders locally.
///
/// `Debug` is meant to track the hosting application's debug flag: a
/// debug-mode dispatcher never contacts the provider and logs the
/// rendered message instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Live,
    Debug,
}

impl Default for DeliveryMode {
    fn default() -> Self {
        DeliveryMode::Live
    }
}

/// Optional overrides for the built-in message templates.
///
/// An absent field keeps the built-in default; a present field replaces
/// it wholesale. Overrides are validated at dispatcher construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateOverrides {
    /// Debug-mode echo of the would-be message.
    pub debug: Option<String>,
    /// Log-record formatting used by the error notifier body.
    pub log_format: Option<String>,
    /// Error-notification subject when the record carries exception info.
    pub subject_exception: Option<String>,
    /// Error-notification subject without exception info.
    pub subject_plain: Option<String>,
    /// Error-notification body.
    pub error_body: Option<String>,
    /// Human display of a provider failure.
    pub api_error: Option<String>,
}

/// Dispatcher configuration, read once at construction.
///
/// `domain` and `api_key` are required in live mode. In debug mode both
/// may be left empty; the domain falls back to `testing` so generated
/// sender addresses stay well-formed. The `api_key` field supports
/// `${VAR}` environment references, resolved at construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    /// Sending domain registered with the provider.
    pub domain: String,
    /// Provider API key.
    pub api_key: SecretString,
    /// Live or debug delivery.
    pub mode: DeliveryMode,
    /// Endpoint URL pattern override; `{domain}` is substituted.
    pub api_url: Option<String>,
    /// Default sender used when a message carries no explicit `from`.
    pub default_sender: Option<String>,
    /// Template overrides.
    pub templates: TemplateOverrides,
}
