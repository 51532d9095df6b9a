//! Configuration for the mail dispatcher.
//!
//! The hosting application owns configuration loading; this module only
//! defines the deserializable types and the validation applied once at
//! dispatcher construction.

mod env;
mod secret;
mod types;

pub use env::resolve_env_vars;
pub use secret::SecretString;
pub use types::{DeliveryMode, MailerConfig, TemplateOverrides};
