//! Confirmation email.
//!
//! The [`Notifier`] trait is the best-effort second stage of the pipeline.
//! Transport lives in the server crate; this module owns the message content
//! and a log-only fallback for deployments without an email provider.

use crate::error::NotificationError;

/// Subject line of the confirmation email.
pub const CONFIRMATION_SUBJECT: &str = "Seu Diagnóstico Financeiro está a caminho! 🎉";

/// Sends the post-submission confirmation to a lead.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Send the confirmation email.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the message was not accepted.
    async fn send_confirmation(&self, name: &str, email: &str) -> Result<(), NotificationError>;
}

/// Notifier used when no email provider is configured. It logs the attempt
/// and reports [`NotificationError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send_confirmation(&self, _name: &str, email: &str) -> Result<(), NotificationError> {
        tracing::info!(to = %mask_email(email), "email provider not configured, skipping confirmation");
        Err(NotificationError::NotConfigured)
    }
}

/// A rendered confirmation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEmail {
    pub subject: &'static str,
    pub html: String,
}

impl ConfirmationEmail {
    /// Render the message greeting `name`.
    #[must_use]
    pub fn for_lead(name: &str) -> Self {
        let name = escape_html(name.trim());
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1.0"></head>
<body style="font-family: 'Segoe UI', Tahoma, sans-serif; margin: 0; padding: 0; background-color: #0a0a0a;">
  <div style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <div style="background: #141414; border-radius: 16px; padding: 40px; border: 1px solid #c9a227;">
      <h1 style="color: #c9a227; margin: 0 0 24px 0; font-size: 28px; text-align: center;">Olá, {name}! 👋</h1>
      <p style="color: #e5e5e5; font-size: 16px; line-height: 1.6;">Recebemos sua solicitação de <strong style="color: #c9a227;">Diagnóstico Financeiro Gratuito</strong> e estamos muito felizes em tê-lo(a) conosco!</p>
      <p style="color: #e5e5e5; font-size: 16px; line-height: 1.6;">Nossa equipe está preparando uma análise personalizada da sua situação financeira. Em breve você receberá:</p>
      <ul style="color: #e5e5e5; font-size: 16px; line-height: 1.8;">
        <li>📊 Análise completa do seu perfil financeiro</li>
        <li>💡 Recomendações personalizadas</li>
        <li>🎯 Estratégias para alcançar seus objetivos</li>
      </ul>
      <p style="color: #a3a3a3; font-size: 14px; text-align: center;">Enquanto isso, fique à vontade para explorar nosso site e conhecer mais sobre nossos serviços.</p>
      <p style="color: #666; font-size: 12px; text-align: center; margin-top: 32px;">© Lanas Finanças. Todos os direitos reservados.</p>
    </div>
  </div>
</body>
</html>
"#
        );
        Self {
            subject: CONFIRMATION_SUBJECT,
            html,
        }
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Mask an email for logs: `ana@example.com` becomes `a***@example.com`.
#[must_use]
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn greeting_escapes_the_name() {
        let mail = ConfirmationEmail::for_lead("<b>Ana</b> & Co");
        assert_eq!(mail.subject, CONFIRMATION_SUBJECT);
        assert!(mail.html.contains("Olá, &lt;b&gt;Ana&lt;/b&gt; &amp; Co!"));
        assert!(!mail.html.contains("<b>Ana</b>"));
    }

    #[test]
    fn masks_local_part() {
        assert_eq!(mask_email("ana@example.com"), "a***@example.com");
        assert_eq!(mask_email("@example.com"), "***@example.com");
        assert_eq!(mask_email("garbage"), "***");
    }

    #[tokio::test]
    async fn log_notifier_reports_not_configured() {
        let err = LogNotifier
            .send_confirmation("Ana", "ana@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::NotConfigured));
    }
}
