//! Log-to-email notification bridge.
//!
//! Adapts error-severity log records into outgoing messages through the
//! normal dispatch pipeline. The hosting application's logging system
//! invokes [`ErrorNotifier::notify`] directly; each record is handled
//! independently and synchronously in the calling task, with no state
//! retained between events.
//!
//! A delivery failure propagates out of the logging call path rather
//! than being swallowed. Because a failed notification may itself be
//! logged and re-enter this adapter, an already-notifying flag
//! suppresses nested attempts instead of recursing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use minijinja::context;

use crate::dispatcher::Mailer;
use crate::error::{SendError, TemplateError};
use crate::message::Message;
use crate::template::TemplateKind;
use crate::transport::Delivery;

/// Timestamp rendering used by the log-format template.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Upper-case severity name as rendered in subjects and bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log event, as produced by the hosting application's logging
/// subsystem. Read-only input to the bridge.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub severity: Severity,
    /// Source file path.
    pub path: String,
    pub line: u32,
    pub module: String,
    pub function: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// String form of the exception, when the record carries one.
    pub exception: Option<String>,
}

/// The web-request context embedded in the notification body.
///
/// Maps iterate in key order, which gives the sorted key-value dumps the
/// body template expects. All maps may be empty.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub session: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
}

fn sorted_pairs(map: &BTreeMap<String, String>) -> Vec<(&str, &str)> {
    map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Turns qualifying log records into outgoing messages.
///
/// Holds the dispatcher, the configured sender and recipient, and
/// nothing else. Records below [`Severity::Error`] are ignored.
pub struct ErrorNotifier {
    mailer: Arc<Mailer>,
    sender: Option<String>,
    recipient: String,
    notifying: AtomicBool,
}

impl ErrorNotifier {
    /// Create a bridge sending to `recipient`.
    ///
    /// When `sender` is `None` the dispatcher's sender fallback applies.
    pub fn new(mailer: Arc<Mailer>, sender: Option<String>, recipient: impl Into<String>) -> Self {
        Self {
            mailer,
            sender,
            recipient: recipient.into(),
            notifying: AtomicBool::new(false),
        }
    }

    /// Handle one log record.
    ///
    /// Returns `Ok(None)` when the record is below the error threshold
    /// or a notification is already in flight; otherwise renders the
    /// subject and body and sends through the dispatcher. A delivery
    /// failure is returned to the caller, not swallowed.
    pub async fn notify(
        &self,
        record: &LogRecord,
        request: Option<&RequestContext>,
    ) -> Result<Option<Delivery>, SendError> {
        if record.severity < Severity::Error {
            return Ok(None);
        }

        if self.notifying.swap(true, Ordering::SeqCst) {
            tracing::warn!(
                severity = record.severity.as_str(),
                "notification already in flight, suppressing nested notify"
            );
            metrics::counter!("mailbridge_notifications_suppressed_total").increment(1);
            return Ok(None);
        }

        let result = self.dispatch(record, request).await;
        self.notifying.store(false, Ordering::SeqCst);
        result.map(Some)
    }

    async fn dispatch(
        &self,
        record: &LogRecord,
        request: Option<&RequestContext>,
    ) -> Result<Delivery, SendError> {
        let subject = self.render_subject(record)?;
        let body = self.render_body(record, request)?;

        let mut message = Message::new(self.recipient.clone())
            .subject(subject)
            .text(body);
        if let Some(sender) = &self.sender {
            message = message.from(sender.clone());
        }

        self.mailer.send(&message).await
    }

    fn render_subject(&self, record: &LogRecord) -> Result<String, TemplateError> {
        let templates = self.mailer.templates();
        match &record.exception {
            Some(exception) => templates.render(
                TemplateKind::SubjectException,
                context! { exception => exception },
            ),
            None => templates.render(
                TemplateKind::SubjectPlain,
                context! {
                    severity => record.severity.as_str(),
                    path => &record.path,
                    line => record.line,
                },
            ),
        }
    }

    fn render_body(
        &self,
        record: &LogRecord,
        request: Option<&RequestContext>,
    ) -> Result<String, TemplateError> {
        let templates = self.mailer.templates();

        let formatted = templates.render(
            TemplateKind::LogFormat,
            context! {
                severity => record.severity.as_str(),
                path => &record.path,
                line => record.line,
                module => &record.module,
                function => &record.function,
                timestamp => record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                message => &record.message,
            },
        )?;

        let empty = RequestContext::default();
        let request = request.unwrap_or(&empty);

        templates.render(
            TemplateKind::ErrorBody,
            context! {
                message => formatted,
                method => &request.method,
                url => &request.url,
                headers => sorted_pairs(&request.headers),
                session => sorted_pairs(&request.session),
                form => sorted_pairs(&request.form),
            },
        )
    }
}

impl std::fmt::Debug for ErrorNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorNotifier")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish()
    }
}
