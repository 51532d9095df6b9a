//! Delivery of a finalized message.
//!
//! Live mode issues one POST to the provider endpoint; debug mode
//! renders the message through the debug template and writes it to the
//! log instead. There is no retry and no queue: one call, one outcome.

use minijinja::context;
use reqwest::StatusCode;

use crate::config::{DeliveryMode, SecretString};
use crate::error::{DeliveryError, SendError};
use crate::message::OutboundMessage;
use crate::template::{TemplateEngine, TemplateKind};

/// Endpoint URL pattern; `{domain}` is substituted at construction.
pub const DEFAULT_API_URL: &str = "https://api.mailgun.net/v3/{domain}/messages";

/// Placeholder echoed for a missing HTML body in debug mode.
const NO_HTML_PLACEHOLDER: &str = "(no HTML)";

/// Successful outcome of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Live mode: the provider accepted the message.
    Sent,
    /// Debug mode: the message was rendered and logged, no network I/O.
    Logged,
}

/// Performs the provider call (or the debug-mode echo) for a dispatcher.
pub struct Transport {
    /// HTTP client (shared, connection pooling).
    client: reqwest::Client,
    /// Fully substituted endpoint URL.
    endpoint: String,
    /// Provider API key, used as the basic-auth password.
    api_key: SecretString,
    mode: DeliveryMode,
}

impl Transport {
    pub(crate) fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: SecretString,
        mode: DeliveryMode,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            mode,
        }
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Deliver a finalized message.
    ///
    /// Debug mode never performs network I/O and always succeeds. Live
    /// mode treats exactly status 200 as acceptance; any other status
    /// becomes a [`DeliveryError`] carrying the response verbatim.
    /// Network-level failures propagate as the underlying client error.
    pub(crate) async fn deliver(
        &self,
        message: &OutboundMessage,
        templates: &TemplateEngine,
    ) -> Result<Delivery, SendError> {
        match self.mode {
            DeliveryMode::Debug => {
                let rendered = templates.render(
                    TemplateKind::Debug,
                    context! {
                        sender => &message.from,
                        to => &message.to,
                        subject => &message.subject,
                        text => message.text.as_deref().unwrap_or_default(),
                        html => message.html.as_deref().unwrap_or(NO_HTML_PLACEHOLDER),
                    },
                )?;
                tracing::debug!(to = %message.to, "{}", rendered);
                Ok(Delivery::Logged)
            }
            DeliveryMode::Live => {
                let response = self
                    .client
                    .post(&self.endpoint)
                    .basic_auth("api", Some(self.api_key.expose()))
                    .form(&message.form_fields())
                    .send()
                    .await?;

                let status = response.status();
                if status == StatusCode::OK {
                    tracing::info!(to = %message.to, "Mailgun accepted message");
                    metrics::counter!("mailbridge_messages_sent_total").increment(1);
                    return Ok(Delivery::Sent);
                }

                let body = response.text().await.unwrap_or_default();
                let rendered = templates.render(
                    TemplateKind::ApiError,
                    context! {
                        method => "POST",
                        url => &self.endpoint,
                        status => status.as_u16(),
                        body => &body,
                    },
                )?;

                tracing::error!(
                    status = status.as_u16(),
                    to = %message.to,
                    "Mailgun rejected message"
                );
                metrics::counter!("mailbridge_send_errors_total").increment(1);

                Err(DeliveryError::new(
                    "POST".to_string(),
                    self.endpoint.clone(),
                    status.as_u16(),
                    body,
                    rendered,
                )
                .into())
            }
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The endpoint may embed the domain but never the key.
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint)
            .field("mode", &self.mode)
            .finish()
    }
}
