use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use atelier_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_API_PORT: u16 = 3002;
const DEFAULT_CACHE_TTL_SECONDS: u32 = 300;
const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub permission_cache_ttl_seconds: u32,
    pub max_write_attempts: u32,
    pub notification_provider: NotificationProviderConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database_url = optional("DATABASE_URL");
        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required to apply migrations".to_owned(),
            ));
        }

        let frontend_url =
            optional("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = optional("API_PORT")
            .map(|value| parse_number::<u16>("API_PORT", &value))
            .transpose()?
            .unwrap_or(DEFAULT_API_PORT);

        let permission_cache_ttl_seconds = optional("PERMISSION_CACHE_TTL_SECONDS")
            .map(|value| parse_number::<u32>("PERMISSION_CACHE_TTL_SECONDS", &value))
            .transpose()?
            .unwrap_or(DEFAULT_CACHE_TTL_SECONDS);

        let max_write_attempts = optional("REVOCATION_MAX_ATTEMPTS")
            .map(|value| parse_number::<u32>("REVOCATION_MAX_ATTEMPTS", &value))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_WRITE_ATTEMPTS);
        if max_write_attempts == 0 {
            return Err(AppError::Validation(
                "REVOCATION_MAX_ATTEMPTS must be at least 1".to_owned(),
            ));
        }

        let required = |name: &str| {
            optional(name).ok_or_else(|| {
                AppError::Validation(format!("{name} is required when NOTIFICATION_PROVIDER=smtp"))
            })
        };

        let notification_provider = match optional("NOTIFICATION_PROVIDER")
            .unwrap_or_else(|| "console".to_owned())
            .as_str()
        {
            "console" => NotificationProviderConfig::Console,
            "smtp" => NotificationProviderConfig::Smtp(SmtpRuntimeConfig {
                host: required("SMTP_HOST")?,
                port: parse_number::<u16>("SMTP_PORT", &required("SMTP_PORT")?)?,
                username: required("SMTP_USERNAME")?,
                password: required("SMTP_PASSWORD")?,
                from_address: required("SMTP_FROM_ADDRESS")?,
            }),
            other => {
                return Err(AppError::Validation(format!(
                    "NOTIFICATION_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            permission_cache_ttl_seconds,
            max_write_attempts,
            notification_provider,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_number<T>(name: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use atelier_core::AppError;
    use proptest::prelude::*;

    use super::{ApiConfig, NotificationProviderConfig, SmtpRuntimeConfig};

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(false, |name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_in_memory_defaults() {
        let config = load(&[]).unwrap_or_else(|_| unreachable!());

        assert_eq!(config.database_url, None);
        assert_eq!(config.api_port, 3002);
        assert_eq!(config.permission_cache_ttl_seconds, 300);
        assert_eq!(config.max_write_attempts, 5);
        assert_eq!(config.notification_provider, NotificationProviderConfig::Console);
        assert!(config.socket_address().is_ok());
    }

    #[test]
    fn smtp_provider_requires_every_smtp_variable() {
        let missing = load(&[("NOTIFICATION_PROVIDER", "smtp"), ("SMTP_HOST", "mail")]);
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let config = load(&[
            ("NOTIFICATION_PROVIDER", "smtp"),
            ("SMTP_HOST", "smtp.oficina.com.br"),
            ("SMTP_PORT", "587"),
            ("SMTP_USERNAME", "avisos"),
            ("SMTP_PASSWORD", "segredo"),
            ("SMTP_FROM_ADDRESS", "avisos@oficina.com.br"),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            config.notification_provider,
            NotificationProviderConfig::Smtp(SmtpRuntimeConfig {
                host: "smtp.oficina.com.br".to_owned(),
                port: 587,
                username: "avisos".to_owned(),
                password: "segredo".to_owned(),
                from_address: "avisos@oficina.com.br".to_owned(),
            })
        );
    }

    #[test]
    fn unknown_provider_and_zero_attempts_are_rejected() {
        assert!(matches!(
            load(&[("NOTIFICATION_PROVIDER", "pigeon")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("REVOCATION_MAX_ATTEMPTS", "0")]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn migrate_requires_a_database() {
        let result = ApiConfig::from_lookup(true, |_| None);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    proptest! {
        #[test]
        fn any_cache_ttl_round_trips(ttl in any::<u32>()) {
            let value = ttl.to_string();
            let config = load(&[("PERMISSION_CACHE_TTL_SECONDS", value.as_str())]);
            prop_assert!(matches!(config, Ok(config) if config.permission_cache_ttl_seconds == ttl));
        }
    }
}
