//! SMTP notification sender using the `lettre` crate.

use async_trait::async_trait;
use atelier_application::{Notification, NotificationSender};
use atelier_core::{AppError, AppResult};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP notification sender configuration.
#[derive(Clone)]
pub struct SmtpNotificationConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

/// Production notification sender using SMTP.
#[derive(Clone)]
pub struct SmtpNotificationSender {
    config: SmtpNotificationConfig,
}

impl SmtpNotificationSender {
    /// Creates a new SMTP notification sender.
    #[must_use]
    pub fn new(config: SmtpNotificationConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, notification: &Notification) -> AppResult<Message> {
        let Some(recipient) = notification.email.as_deref() else {
            return Err(AppError::Validation(format!(
                "member '{}' has no email address to notify",
                notification.user_id
            )));
        };

        let from: Mailbox = self
            .config
            .from_address
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid from address: {error}")))?;

        let to: Mailbox = recipient.parse().map_err(|error| {
            AppError::Validation(format!("invalid recipient address: {error}"))
        })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(notification.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        let message = self.build_message(&notification)?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Dependency(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|error| AppError::Dependency(format!("failed to send email: {error}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use atelier_application::Notification;
    use atelier_core::{AppError, TenantId};

    use super::{SmtpNotificationConfig, SmtpNotificationSender};

    fn sender(from_address: &str) -> SmtpNotificationSender {
        SmtpNotificationSender::new(SmtpNotificationConfig {
            host: "smtp.oficina.com.br".to_owned(),
            port: 587,
            username: "avisos".to_owned(),
            password: "segredo".to_owned(),
            from_address: from_address.to_owned(),
        })
    }

    fn notification(email: Option<&str>) -> Notification {
        Notification {
            tenant_id: TenantId::new(),
            user_id: "ana".to_owned(),
            email: email.map(str::to_owned),
            subject: "Suas permissões foram alteradas".to_owned(),
            body: "Permissões removidas: inventory.count".to_owned(),
        }
    }

    #[test]
    fn builds_a_plain_text_message() {
        let message = sender("avisos@oficina.com.br")
            .build_message(&notification(Some("ana@oficina.com.br")));

        assert!(message.is_ok());
    }

    #[test]
    fn member_without_email_cannot_be_notified() {
        let message = sender("avisos@oficina.com.br").build_message(&notification(None));

        assert!(matches!(message, Err(AppError::Validation(_))));
    }

    #[test]
    fn invalid_sender_address_is_an_internal_error() {
        let message =
            sender("not an address").build_message(&notification(Some("ana@oficina.com.br")));

        assert!(matches!(message, Err(AppError::Internal(_))));
    }
}
