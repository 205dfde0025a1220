//! Resend email notifier.
//!
//! Posts the confirmation email to the Resend HTTP API. The request is sent
//! once; the pipeline decides what a failure means.

use serde::{Deserialize, Serialize};

use lanas_core::error::NotificationError;
use lanas_core::notify::{ConfirmationEmail, Notifier};

use crate::config::MailConfig;

/// Sends confirmation emails through Resend.
#[derive(Clone)]
pub struct ResendNotifier {
    client: reqwest::Client,
    config: MailConfig,
}

impl std::fmt::Debug for ResendNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendNotifier")
            .field("endpoint", &self.config.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ResendNotifier {
    #[must_use]
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for ResendNotifier {
    async fn send_confirmation(&self, name: &str, email: &str) -> Result<(), NotificationError> {
        let message = ConfirmationEmail::for_lead(name);
        let body = SendEmailRequest {
            from: &self.config.from,
            to: [email],
            subject: message.subject,
            html: &message.html,
        };

        let resp = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::Transport {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ResendErrorBody>(&text)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                if text.is_empty() {
                    "failed to send email".to_owned()
                } else {
                    text
                }
            });
        Err(NotificationError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn notifier(server: &MockServer) -> ResendNotifier {
        ResendNotifier::new(MailConfig {
            api_key: "re_test".to_owned(),
            from: "Lanas Finanças <onboarding@resend.dev>".to_owned(),
            endpoint: format!("{}/emails", server.uri()),
        })
    }

    #[tokio::test]
    async fn posts_message_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "e1"})))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server)
            .send_confirmation("Ana", "ana@example.com")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(sent["to"], serde_json::json!(["ana@example.com"]));
        assert_eq!(sent["subject"], lanas_core::notify::CONFIRMATION_SUBJECT);
        assert!(sent["html"].as_str().unwrap().contains("Olá, Ana!"));
    }

    #[tokio::test]
    async fn provider_error_is_rejected_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"message": "invalid `to` field"})),
            )
            .mount(&server)
            .await;

        let err = notifier(&server)
            .send_confirmation("Ana", "not-an-email")
            .await
            .unwrap_err();
        match err {
            NotificationError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "invalid `to` field");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        let notifier = ResendNotifier::new(MailConfig {
            api_key: "re_test".to_owned(),
            from: "x@y.z".to_owned(),
            endpoint: "http://127.0.0.1:1/emails".to_owned(),
        });
        let err = notifier
            .send_confirmation("Ana", "ana@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Transport { .. }));
    }
}
