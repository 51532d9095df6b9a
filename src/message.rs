//! Outgoing message construction.
//!
//! [`Message`] is the caller-facing draft: named optional fields filled
//! through a chainable builder. The dispatcher finalizes a draft into an
//! [`OutboundMessage`], applying the sender fallback and the plain-text
//! derivation, and rejecting drafts with no body at all.

use crate::error::BuildError;

/// Line width used when deriving a plain-text body from HTML.
const TEXT_FALLBACK_WIDTH: usize = 80;

/// Convert an HTML body to readable plain text.
///
/// Approximate Markdown-style rendering; used as the fallback `text`
/// body when a message only supplies `html`.
pub fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_FALLBACK_WIDTH)
}

/// A draft message.
///
/// `to` is required at construction; everything else is optional. An
/// empty subject is passed through unchanged. Extra provider parameters
/// (`cc`, `o:tag`, ...) are forwarded verbatim in the form body.
///
/// # Example
///
/// ```
/// use mailbridge::Message;
///
/// let message = Message::new("user@example.test")
///     .subject("Welcome")
///     .html("<h1>Hello</h1>")
///     .param("o:tag", "onboarding");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub(crate) to: String,
    pub(crate) subject: String,
    pub(crate) from: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) html: Option<String>,
    pub(crate) params: Vec<(String, String)>,
}

impl Message {
    /// Start a draft addressed to `to`.
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ..Default::default()
        }
    }

    /// Explicit sender address, overriding the configured fallbacks.
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Plain-text body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// HTML body.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Extra provider parameter forwarded verbatim.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn to_addr(&self) -> &str {
        &self.to
    }
}

/// A finalized message ready for delivery.
///
/// Invariants: `from` is always populated; at least one of `text` and
/// `html` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub params: Vec<(String, String)>,
}

impl OutboundMessage {
    /// Finalize a draft.
    ///
    /// `fallback_from` is the sender used when the draft has none
    /// (configured default sender, or the generated `no-reply@<domain>`).
    /// A missing `text` body is derived from `html` when possible.
    pub(crate) fn finalize(message: &Message, fallback_from: String) -> Result<Self, BuildError> {
        if message.to.trim().is_empty() {
            return Err(BuildError::MissingRecipient);
        }

        let from = message.from.clone().unwrap_or(fallback_from);

        let text = match (&message.text, &message.html) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(html)) => Some(html_to_text(html)),
            (None, None) => return Err(BuildError::MissingBody),
        };

        Ok(Self {
            from,
            to: message.to.clone(),
            subject: message.subject.clone(),
            text,
            html: message.html.clone(),
            params: message.params.clone(),
        })
    }

    /// The form-encoded wire pairs, in provider field order.
    pub fn form_fields(&self) -> Vec<(&str, &str)> {
        let mut fields = vec![
            ("from", self.from.as_str()),
            ("to", self.to.as_str()),
            ("subject", self.subject.as_str()),
        ];
        if let Some(text) = &self.text {
            fields.push(("text", text));
        }
        if let Some(html) = &self.html {
            fields.push(("html", html));
        }
        for (key, value) in &self.params {
            fields.push((key, value));
        }
        fields
    }
}
