use std::sync::Arc;

use atelier_application::NotificationSender;
use atelier_infrastructure::{
    ConsoleNotificationSender, SmtpNotificationConfig, SmtpNotificationSender,
};

use crate::api_config::NotificationProviderConfig;

pub(super) fn build_notification_sender(
    provider: &NotificationProviderConfig,
) -> Arc<dyn NotificationSender> {
    match provider {
        NotificationProviderConfig::Console => Arc::new(ConsoleNotificationSender::new()),
        NotificationProviderConfig::Smtp(smtp) => {
            Arc::new(SmtpNotificationSender::new(SmtpNotificationConfig {
                host: smtp.host.clone(),
                port: smtp.port,
                username: smtp.username.clone(),
                password: smtp.password.clone(),
                from_address: smtp.from_address.clone(),
            }))
        }
    }
}
