use booking_services::{PricingError, PricingTable};
use std::env;
use std::str::FromStr;

/// Errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds something that does not parse.
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// The configured tariff is rejected by the pricing calculator.
    #[error("Invalid pricing: {0}")]
    Pricing(#[from] PricingError),

    /// SES needs a sender address.
    #[error("FROM_EMAIL must be set when NOTIFIER=ses")]
    MissingFromEmail,
}

/// How confirmation emails are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierKind {
    /// Only log the message
    Log,
    /// Send through AWS SES from the given address
    Ses {
        /// Sender address
        from_email: String,
    },
}

/// Server settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Pool size
    pub max_connections: u32,
    /// Listen address
    pub bind_address: String,
    /// Listen port
    pub port: u16,
    /// Tariff used for every quote and booking
    pub pricing: PricingTable,
    /// Built front-end served at `/`
    pub static_dir: Option<String>,
    /// Confirmation email delivery
    pub notifier: NotifierKind,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let defaults = PricingTable::default();
        let pricing = PricingTable::new(
            parse_or(&get, "PRICE_PER_DAY", defaults.per_day)?,
            parse_or(&get, "PRICE_PER_WEEK", defaults.per_week)?,
            parse_or(&get, "PRICE_PER_MONTH", defaults.per_month)?,
        )?;

        let notifier = match get("NOTIFIER").as_deref().map(str::trim) {
            None | Some("log") => NotifierKind::Log,
            Some("ses") => NotifierKind::Ses {
                from_email: get("FROM_EMAIL").ok_or(ConfigError::MissingFromEmail)?,
            },
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "NOTIFIER",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost/camper_booking".to_string()),
            max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            pricing,
            static_dir: get("STATIC_DIR"),
            notifier,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}
