//! Console notification sender for development. Logs notifications to tracing output.

use async_trait::async_trait;
use atelier_application::{Notification, NotificationSender};
use atelier_core::AppResult;
use tracing::info;

/// Development notification sender that logs messages to the console.
#[derive(Clone, Default)]
pub struct ConsoleNotificationSender;

impl ConsoleNotificationSender {
    /// Creates a new console notification sender.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSender for ConsoleNotificationSender {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        let to = notification
            .email
            .as_deref()
            .unwrap_or(notification.user_id.as_str());

        info!(
            tenant_id = %notification.tenant_id,
            user_id = %notification.user_id,
            subject = %notification.subject,
            "--- NOTIFICATION (console) ---\nTo: {}\nSubject: {}\n\n{}\n--- END NOTIFICATION ---",
            to,
            notification.subject,
            notification.body
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use atelier_application::{Notification, NotificationSender};
    use atelier_core::TenantId;

    use super::ConsoleNotificationSender;

    #[tokio::test]
    async fn delivery_without_an_email_still_succeeds() {
        let sender = ConsoleNotificationSender::new();

        let result = sender
            .notify(Notification {
                tenant_id: TenantId::new(),
                user_id: "ana".to_owned(),
                email: None,
                subject: "Suas permissões foram alteradas".to_owned(),
                body: "Permissões removidas: inventory.count".to_owned(),
            })
            .await;

        assert!(result.is_ok());
    }
}
