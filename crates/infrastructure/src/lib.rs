//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_notification_sender;
mod in_memory_access_repository;
mod in_memory_permission_cache;
mod postgres_columns;
mod postgres_custom_role_repository;
mod postgres_granular_override_repository;
mod postgres_member_repository;
mod postgres_profile_repository;
mod smtp_notification_sender;

#[cfg(test)]
mod test_fixtures;

pub use console_notification_sender::ConsoleNotificationSender;
pub use in_memory_access_repository::InMemoryAccessRepository;
pub use in_memory_permission_cache::InMemoryPermissionCache;
pub use postgres_custom_role_repository::PostgresCustomRoleRepository;
pub use postgres_granular_override_repository::PostgresGranularOverrideRepository;
pub use postgres_member_repository::PostgresMemberRepository;
pub use postgres_profile_repository::PostgresProfileRepository;
pub use smtp_notification_sender::{SmtpNotificationConfig, SmtpNotificationSender};
