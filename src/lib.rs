// src/lib.rs
//! Mailbridge - Mailgun-backed transactional email for web applications,
//! with an error-log notification bridge.
//!
//! Construct a [`Mailer`] from its configuration and pass it explicitly
//! to whatever needs to send mail. In live mode each send is one POST to
//! the provider; in debug mode the message is rendered into the log and
//! nothing leaves the process. The [`ErrorNotifier`] adapts
//! error-severity log records into the same pipeline.

pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod template;
pub mod transport;

// Re-export commonly used types
pub use bridge::{ErrorNotifier, LogRecord, RequestContext, Severity};
pub use config::{resolve_env_vars, DeliveryMode, MailerConfig, SecretString, TemplateOverrides};
pub use dispatcher::Mailer;
pub use error::{BuildError, ConfigError, DeliveryError, SendError, TemplateError};
pub use message::{html_to_text, Message, OutboundMessage};
pub use template::{TemplateEngine, TemplateKind, TemplateSet};
pub use transport::{Delivery, DEFAULT_API_URL};
