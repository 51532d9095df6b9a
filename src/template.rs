//! Message templating for dispatch and error notification.
//!
//! All rendered text in the crate flows through this module: the
//! debug-mode echo, the error-notification subject and body, the
//! log-record formatting embedded in that body, and the human display of
//! a provider failure. Each template has a built-in default and can be
//! replaced wholesale through [`TemplateOverrides`].
//!
//! Rendering is strict: a template that references a field absent from
//! its context fails with [`TemplateError`] instead of producing partial
//! output.

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use crate::config::TemplateOverrides;
use crate::error::{ConfigError, TemplateError};

/// Debug-mode echo of the would-be message.
///
/// Context fields: `sender`, `to`, `subject`, `text`, `html`.
pub const DEFAULT_DEBUG_TEMPLATE: &str = "\
Mailgun send

From:       {{ sender }}
To:         {{ to }}
Subject:    {{ subject }}

{{ text }}

----------------------------------------

{{ html }}
";

/// Log-record formatting.
///
/// Context fields: `severity`, `path`, `line`, `module`, `function`,
/// `timestamp`, `message`.
pub const DEFAULT_LOG_FORMAT_TEMPLATE: &str = "\
Severity:   {{ severity }}
Location:   {{ path }}:{{ line }}
Module:     {{ module }}
Function:   {{ function }}
Time:       {{ timestamp }}

{{ message }}
";

/// Error-notification subject when the record carries exception info.
///
/// Context fields: `exception`.
pub const DEFAULT_SUBJECT_EXCEPTION_TEMPLATE: &str = "ERROR: {{ exception }}";

/// Error-notification subject without exception info.
///
/// Context fields: `severity`, `path`, `line`.
pub const DEFAULT_SUBJECT_PLAIN_TEMPLATE: &str = "{{ severity }}: {{ path }}:{{ line }}";

/// Error-notification body.
///
/// Context fields: `message`, `method`, `url`, and `headers`, `session`,
/// `form` as lists of key-value pairs sorted by key. Values are inserted
/// verbatim; no HTML escaping is applied.
pub const DEFAULT_ERROR_BODY_TEMPLATE: &str = "\
{{ message }}

{{ method }} {{ url }}
{% for key, val in headers %}{{ key }}: {{ val }}
{% endfor %}{% for key, val in session %}Session: {{ key }}={{ val }}
{% endfor %}{% for key, val in form %}{{ key }}={{ val }}
{% endfor %}";

/// Human display of a provider failure.
///
/// Context fields: `method`, `url`, `status`, `body`.
pub const DEFAULT_API_ERROR_TEMPLATE: &str = "\
Mailgun API {{ method }} at {{ url }} failed with status code {{ status }}:
{{ body }}";

/// Selects which template a render call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Debug,
    LogFormat,
    SubjectException,
    SubjectPlain,
    ErrorBody,
    ApiError,
}

impl TemplateKind {
    /// Stable name used in configuration errors.
    pub fn name(&self) -> &'static str {
        match self {
            TemplateKind::Debug => "debug",
            TemplateKind::LogFormat => "log_format",
            TemplateKind::SubjectException => "subject_exception",
            TemplateKind::SubjectPlain => "subject_plain",
            TemplateKind::ErrorBody => "error_body",
            TemplateKind::ApiError => "api_error",
        }
    }

    fn all() -> [TemplateKind; 6] {
        [
            TemplateKind::Debug,
            TemplateKind::LogFormat,
            TemplateKind::SubjectException,
            TemplateKind::SubjectPlain,
            TemplateKind::ErrorBody,
            TemplateKind::ApiError,
        ]
    }
}

/// The six template strings used by a dispatcher instance.
///
/// Each template is independent: overriding one leaves the others at
/// their built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSet {
    pub debug: String,
    pub log_format: String,
    pub subject_exception: String,
    pub subject_plain: String,
    pub error_body: String,
    pub api_error: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            debug: DEFAULT_DEBUG_TEMPLATE.to_string(),
            log_format: DEFAULT_LOG_FORMAT_TEMPLATE.to_string(),
            subject_exception: DEFAULT_SUBJECT_EXCEPTION_TEMPLATE.to_string(),
            subject_plain: DEFAULT_SUBJECT_PLAIN_TEMPLATE.to_string(),
            error_body: DEFAULT_ERROR_BODY_TEMPLATE.to_string(),
            api_error: DEFAULT_API_ERROR_TEMPLATE.to_string(),
        }
    }
}

impl TemplateSet {
    /// Apply configured overrides on top of the built-in defaults.
    pub fn with_overrides(overrides: &TemplateOverrides) -> Self {
        let defaults = Self::default();
        Self {
            debug: overrides.debug.clone().unwrap_or(defaults.debug),
            log_format: overrides.log_format.clone().unwrap_or(defaults.log_format),
            subject_exception: overrides
                .subject_exception
                .clone()
                .unwrap_or(defaults.subject_exception),
            subject_plain: overrides
                .subject_plain
                .clone()
                .unwrap_or(defaults.subject_plain),
            error_body: overrides.error_body.clone().unwrap_or(defaults.error_body),
            api_error: overrides.api_error.clone().unwrap_or(defaults.api_error),
        }
    }

    fn source(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::Debug => &self.debug,
            TemplateKind::LogFormat => &self.log_format,
            TemplateKind::SubjectException => &self.subject_exception,
            TemplateKind::SubjectPlain => &self.subject_plain,
            TemplateKind::ErrorBody => &self.error_body,
            TemplateKind::ApiError => &self.api_error,
        }
    }
}

/// Validate a template source without rendering it.
fn validate_template(kind: TemplateKind, source: &str) -> Result<(), ConfigError> {
    let mut env = Environment::new();
    env.add_template("_validate", source)
        .map_err(|e| ConfigError::InvalidTemplate {
            name: kind.name().to_string(),
            message: e.to_string(),
        })?;
    Ok(())
}

/// Template renderer for a dispatcher instance.
///
/// The environment is created once at construction and reused for all
/// render operations. Rendering is a pure string transformation; no I/O.
pub struct TemplateEngine {
    env: Environment<'static>,
    set: TemplateSet,
}

impl TemplateEngine {
    /// Create an engine, syntax-checking every template up front.
    ///
    /// A malformed override fails here rather than at the first send.
    pub fn new(set: TemplateSet) -> Result<Self, ConfigError> {
        for kind in TemplateKind::all() {
            validate_template(kind, set.source(kind))?;
        }

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        Ok(Self { env, set })
    }

    /// Render one of the configured templates with the given context.
    pub fn render<S: Serialize>(
        &self,
        kind: TemplateKind,
        ctx: S,
    ) -> Result<String, TemplateError> {
        self.env
            .render_str(self.set.source(kind), ctx)
            .map_err(|e| TemplateError::RenderFailed {
                message: e.to_string(),
            })
    }

    /// The template strings in effect for this engine.
    pub fn set(&self) -> &TemplateSet {
        &self.set
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}
