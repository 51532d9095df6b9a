//! The mail dispatcher.
//!
//! A [`Mailer`] is constructed once from its configuration and passed
//! explicitly to whatever needs to send mail, including the error-log
//! notification bridge. There is no global registration or ambient
//! lookup; the instance is immutable after construction and safe to
//! share across threads behind an `Arc`.

use tracing::Instrument;

use crate::config::{resolve_env_vars, DeliveryMode, MailerConfig, SecretString};
use crate::error::{BuildError, ConfigError, SendError};
use crate::message::{Message, OutboundMessage};
use crate::template::{TemplateEngine, TemplateSet};
use crate::transport::{Delivery, Transport, DEFAULT_API_URL};

/// Domain substituted in debug mode when none is configured, so
/// generated sender addresses stay well-formed.
const DEBUG_DOMAIN: &str = "testing";

/// Builds and delivers one message per call.
///
/// # Example
///
/// ```no_run
/// use mailbridge::{Mailer, MailerConfig, Message, SecretString};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = Mailer::new(MailerConfig {
///     domain: "example.test".to_string(),
///     api_key: SecretString::new("key-abc".to_string()),
///     ..Default::default()
/// })?;
///
/// let message = Message::new("user@example.test")
///     .subject("Welcome")
///     .text("Glad you are here.");
/// mailer.send(&message).await?;
/// # Ok(())
/// # }
/// ```
pub struct Mailer {
    domain: String,
    default_sender: Option<String>,
    templates: TemplateEngine,
    transport: Transport,
}

impl Mailer {
    /// Create a dispatcher with a fresh HTTP client.
    pub fn new(config: MailerConfig) -> Result<Self, ConfigError> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a dispatcher with an injected HTTP client.
    ///
    /// Validates the configuration up front: live mode requires a domain
    /// and an API key, and every template override must parse. The API
    /// key may reference environment variables as `${VAR}`.
    pub fn with_client(config: MailerConfig, client: reqwest::Client) -> Result<Self, ConfigError> {
        let MailerConfig {
            mut domain,
            api_key,
            mode,
            api_url,
            default_sender,
            templates,
        } = config;

        let api_key = resolve_env_vars(api_key.expose())?;

        match mode {
            DeliveryMode::Live => {
                if domain.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "domain is required in live mode".to_string(),
                    ));
                }
                if api_key.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "api_key is required in live mode".to_string(),
                    ));
                }
            }
            DeliveryMode::Debug => {
                if domain.is_empty() {
                    domain = DEBUG_DOMAIN.to_string();
                }
            }
        }

        let endpoint = api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .replace("{domain}", &domain);

        let templates = TemplateEngine::new(TemplateSet::with_overrides(&templates))?;
        let transport = Transport::new(client, endpoint, SecretString::new(api_key), mode);

        Ok(Self {
            domain,
            default_sender,
            templates,
            transport,
        })
    }

    /// Finalize a draft without sending it.
    ///
    /// Applies the sender fallback chain (explicit `from`, then the
    /// configured default sender, then `no-reply@<domain>`) and derives
    /// a plain-text body from `html` when `text` is absent.
    pub fn prepare(&self, message: &Message) -> Result<OutboundMessage, BuildError> {
        let fallback_from = self
            .default_sender
            .clone()
            .unwrap_or_else(|| format!("no-reply@{}", self.domain));
        OutboundMessage::finalize(message, fallback_from)
    }

    /// Build and deliver one message.
    ///
    /// Debug mode renders the message into the log and always succeeds;
    /// live mode blocks on one provider POST and reports the outcome.
    pub async fn send(&self, message: &Message) -> Result<Delivery, SendError> {
        let span = tracing::info_span!("send_mail", to = %message.to_addr());

        async {
            let outbound = self.prepare(message)?;
            self.transport.deliver(&outbound, &self.templates).await
        }
        .instrument(span)
        .await
    }

    /// The sending domain in effect (after debug-mode defaulting).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The delivery mode in effect.
    pub fn mode(&self) -> DeliveryMode {
        self.transport.mode()
    }

    /// The fully substituted endpoint URL.
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub(crate) fn templates(&self) -> &TemplateEngine {
        &self.templates
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("domain", &self.domain)
            .field("mode", &self.mode())
            .field("default_sender", &self.default_sender)
            .finish()
    }
}
