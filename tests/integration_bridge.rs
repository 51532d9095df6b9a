//! Integration tests for the log-to-email notification bridge.
//!
//! Uses wiremock to simulate the Mailgun messages endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mailbridge::{
    Delivery, DeliveryMode, ErrorNotifier, LogRecord, Mailer, MailerConfig, RequestContext,
    SecretString, SendError, Severity, TemplateOverrides,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create client")
}

fn make_mailer(server: &MockServer, templates: TemplateOverrides) -> Arc<Mailer> {
    let config = MailerConfig {
        domain: "example.test".to_string(),
        api_key: SecretString::new("key-secret".to_string()),
        mode: DeliveryMode::Live,
        api_url: Some(format!("{}/v3/{{domain}}/messages", server.uri())),
        templates,
        ..Default::default()
    };
    Arc::new(Mailer::with_client(config, make_client()).unwrap())
}

fn make_record(exception: Option<&str>) -> LogRecord {
    LogRecord {
        severity: Severity::Error,
        path: "src/views.rs".to_string(),
        line: 88,
        module: "views".to_string(),
        function: "checkout".to_string(),
        timestamp: Utc.with_ymd_and_hms(2026, 8, 5, 9, 30, 0).unwrap(),
        message: "payment backend unreachable".to_string(),
        exception: exception.map(String::from),
    }
}

fn make_request_context() -> RequestContext {
    let mut headers = BTreeMap::new();
    headers.insert("Host".to_string(), "app.example.test".to_string());

    let mut session = BTreeMap::new();
    session.insert("user_id".to_string(), "42".to_string());

    let mut form = BTreeMap::new();
    form.insert("quantity".to_string(), "3".to_string());

    RequestContext {
        method: "POST".to_string(),
        url: "https://app.example.test/checkout".to_string(),
        headers,
        session,
        form,
    }
}

fn form_pairs(body: &[u8]) -> Vec<(String, String)> {
    serde_urlencoded::from_bytes(body).expect("form-encoded body")
}

fn field<'a>(pairs: &'a [(String, String)], key: &str) -> &'a str {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or_else(|| panic!("missing form field '{}'", key))
}

#[tokio::test]
async fn notify_sends_templated_notification() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/example.test/messages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mailer = make_mailer(&mock_server, TemplateOverrides::default());
    let notifier = ErrorNotifier::new(
        mailer,
        Some("alerts@example.test".to_string()),
        "ops@example.test",
    );

    let result = notifier
        .notify(&make_record(None), Some(&make_request_context()))
        .await;
    assert!(matches!(result, Ok(Some(Delivery::Sent))));

    let requests = mock_server.received_requests().await.unwrap();
    let pairs = form_pairs(&requests[0].body);

    assert_eq!(field(&pairs, "from"), "alerts@example.test");
    assert_eq!(field(&pairs, "to"), "ops@example.test");
    assert_eq!(field(&pairs, "subject"), "ERROR: src/views.rs:88");

    let text = field(&pairs, "text");
    assert!(text.contains("Severity:   ERROR"));
    assert!(text.contains("Location:   src/views.rs:88"));
    assert!(text.contains("payment backend unreachable"));
    assert!(text.contains("POST https://app.example.test/checkout"));
    assert!(text.contains("Host: app.example.test"));
    assert!(text.contains("Session: user_id=42"));
    assert!(text.contains("quantity=3"));
}

#[tokio::test]
async fn notify_with_exception_uses_exception_subject() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let mailer = make_mailer(&mock_server, TemplateOverrides::default());
    let notifier = ErrorNotifier::new(mailer, None, "ops@example.test");

    notifier
        .notify(&make_record(Some("division by zero")), None)
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let pairs = form_pairs(&requests[0].body);
    assert_eq!(field(&pairs, "subject"), "ERROR: division by zero");
}

#[tokio::test]
async fn notify_without_sender_uses_generated_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let mailer = make_mailer(&mock_server, TemplateOverrides::default());
    let notifier = ErrorNotifier::new(mailer, None, "ops@example.test");

    notifier.notify(&make_record(None), None).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let pairs = form_pairs(&requests[0].body);
    assert_eq!(field(&pairs, "from"), "no-reply@example.test");
}

#[tokio::test]
async fn notify_below_threshold_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mailer = make_mailer(&mock_server, TemplateOverrides::default());
    let notifier = ErrorNotifier::new(mailer, None, "ops@example.test");

    let mut record = make_record(None);
    record.severity = Severity::Warning;

    let result = notifier.notify(&record, None).await;
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn delivery_failure_propagates_and_releases_guard() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mailer = make_mailer(&mock_server, TemplateOverrides::default());
    let notifier = ErrorNotifier::new(mailer, None, "ops@example.test");

    let result = notifier.notify(&make_record(None), None).await;
    match result {
        Err(SendError::Delivery(err)) => assert_eq!(err.status, 500),
        other => panic!("expected DeliveryError, got {:?}", other),
    }

    // The guard is released after a failure; the next record goes out.
    let result = notifier.notify(&make_record(None), None).await;
    assert!(matches!(result, Err(SendError::Delivery(_))));
}

#[tokio::test]
async fn subject_template_override_changes_only_the_subject() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let mailer = make_mailer(
        &mock_server,
        TemplateOverrides {
            subject_plain: Some("[{{ severity }}] in {{ path }}".to_string()),
            ..Default::default()
        },
    );
    let notifier = ErrorNotifier::new(mailer, None, "ops@example.test");

    notifier.notify(&make_record(None), None).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let pairs = form_pairs(&requests[0].body);
    assert_eq!(field(&pairs, "subject"), "[ERROR] in src/views.rs");

    // The body still renders from the default templates.
    let text = field(&pairs, "text");
    assert!(text.contains("Severity:   ERROR"));
}
