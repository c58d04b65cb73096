//! API server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                 | Default        | Meaning                                  |
//! |--------------------------|----------------|------------------------------------------|
//! | `CAFE_HTTP_PORT`         | `8080`         | HTTP listen port                         |
//! | `CAFE_DB_PATH`           | `./cafe.db`    | SQLite file (`:memory:` for tests)       |
//! | `CAFE_JWT_SECRET`        | unset          | When set, `/api/*` requires a bearer JWT |
//! | `CAFE_STORE_NAME`        | dev store      | Receipt header                           |
//! | `CAFE_STORE_ADDRESS`     | dev store      | Receipt header                           |
//! | `CAFE_STORE_PHONE`       | dev store      | Receipt header                           |
//! | `CAFE_THANK_YOU`         | dev store      | Receipt footer                           |
//! | `CAFE_CURRENCY_SYMBOL`   | `₫`            | Receipt currency symbol                  |
//! | `CAFE_CURRENCY_DECIMALS` | `0`            | Minor-unit digits                        |
//! | `CAFE_SURCHARGE_KIND`    | `none`         | `none`, `flat` or `percent`              |
//! | `CAFE_SURCHARGE_VALUE`   | unset          | Minor units (flat) or basis points       |
//! | `CAFE_RECEIPT_WIDTH`     | `42`           | Text receipt width in characters         |

use std::env;

use cafe_core::validation::{validate_amount, validate_percentage};
use cafe_core::{
    CurrencyFormat, Money, Percentage, StoreIdentity, SurchargePolicy, DEFAULT_RECEIPT_WIDTH,
};

/// Narrowest receipt the text renderer is allowed to produce.
const MIN_RECEIPT_WIDTH: usize = 24;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub db_path: String,

    /// HS256 secret for bearer token verification (auth disabled when unset)
    pub jwt_secret: Option<String>,

    /// Store details printed on bills
    pub store: StoreIdentity,

    /// Currency formatting for text receipts
    pub currency: CurrencyFormat,

    /// Store-wide service fee
    pub surcharge: SurchargePolicy,

    /// Text receipt width in characters
    pub receipt_width: usize,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StoreIdentity::default();
        let currency_defaults = CurrencyFormat::default();

        let config = ApiConfig {
            http_port: parse_or(&lookup, "CAFE_HTTP_PORT", 8080)?,

            db_path: lookup("CAFE_DB_PATH").unwrap_or_else(|| "./cafe.db".to_string()),

            jwt_secret: lookup("CAFE_JWT_SECRET").filter(|s| !s.trim().is_empty()),

            store: StoreIdentity {
                name: lookup("CAFE_STORE_NAME").unwrap_or(defaults.name),
                address: lookup("CAFE_STORE_ADDRESS").unwrap_or(defaults.address),
                phone: lookup("CAFE_STORE_PHONE").unwrap_or(defaults.phone),
                thank_you_message: lookup("CAFE_THANK_YOU").unwrap_or(defaults.thank_you_message),
            },

            currency: CurrencyFormat {
                symbol: lookup("CAFE_CURRENCY_SYMBOL").unwrap_or(currency_defaults.symbol),
                decimals: parse_or(&lookup, "CAFE_CURRENCY_DECIMALS", currency_defaults.decimals)?,
                ..currency_defaults
            },

            surcharge: surcharge_from(&lookup)?,

            receipt_width: parse_or(&lookup, "CAFE_RECEIPT_WIDTH", DEFAULT_RECEIPT_WIDTH)?,
        };

        if config.currency.decimals > 4 {
            return Err(ConfigError::InvalidValue("CAFE_CURRENCY_DECIMALS".to_string()));
        }
        if config.receipt_width < MIN_RECEIPT_WIDTH {
            return Err(ConfigError::InvalidValue("CAFE_RECEIPT_WIDTH".to_string()));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn surcharge_from<F>(lookup: &F) -> Result<SurchargePolicy, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let kind = lookup("CAFE_SURCHARGE_KIND").unwrap_or_else(|| "none".to_string());

    let value = || -> Result<i64, ConfigError> {
        let raw = lookup("CAFE_SURCHARGE_VALUE")
            .ok_or_else(|| ConfigError::MissingRequired("CAFE_SURCHARGE_VALUE".to_string()))?;
        raw.trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("CAFE_SURCHARGE_VALUE".to_string()))
    };

    match kind.trim().to_ascii_lowercase().as_str() {
        "none" | "" => Ok(SurchargePolicy::None),
        "flat" => {
            let minor = value()?;
            validate_amount("surcharge", minor)
                .map_err(|_| ConfigError::InvalidValue("CAFE_SURCHARGE_VALUE".to_string()))?;
            Ok(SurchargePolicy::Flat(Money::from_minor(minor)))
        }
        "percent" => {
            let bps = u32::try_from(value()?)
                .map_err(|_| ConfigError::InvalidValue("CAFE_SURCHARGE_VALUE".to_string()))?;
            let rate = Percentage::from_bps(bps);
            validate_percentage("surcharge", rate)
                .map_err(|_| ConfigError::InvalidValue("CAFE_SURCHARGE_VALUE".to_string()))?;
            Ok(SurchargePolicy::Percentage(rate))
        }
        _ => Err(ConfigError::InvalidValue("CAFE_SURCHARGE_KIND".to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.db_path, "./cafe.db");
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.currency.symbol, "₫");
        assert_eq!(config.currency.decimals, 0);
        assert_eq!(config.surcharge, SurchargePolicy::None);
        assert_eq!(config.receipt_width, DEFAULT_RECEIPT_WIDTH);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CAFE_HTTP_PORT", "9000"),
            ("CAFE_JWT_SECRET", "s3cret"),
            ("CAFE_STORE_NAME", "Cộng Cà Phê"),
            ("CAFE_CURRENCY_SYMBOL", "$"),
            ("CAFE_CURRENCY_DECIMALS", "2"),
            ("CAFE_SURCHARGE_KIND", "percent"),
            ("CAFE_SURCHARGE_VALUE", "500"),
            ("CAFE_RECEIPT_WIDTH", "32"),
        ])
        .unwrap();

        assert_eq!(config.http_port, 9000);
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.store.name, "Cộng Cà Phê");
        assert_eq!(config.currency.symbol, "$");
        assert_eq!(config.currency.decimals, 2);
        assert_eq!(
            config.surcharge,
            SurchargePolicy::Percentage(Percentage::from_bps(500))
        );
        assert_eq!(config.receipt_width, 32);
    }

    #[test]
    fn test_flat_surcharge() {
        let config = load(&[("CAFE_SURCHARGE_KIND", "flat"), ("CAFE_SURCHARGE_VALUE", "5000")])
            .unwrap();
        assert_eq!(config.surcharge, SurchargePolicy::Flat(Money::from_minor(5000)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("CAFE_HTTP_PORT", "eighty")]),
            Err(ConfigError::InvalidValue(v)) if v == "CAFE_HTTP_PORT"
        ));
        assert!(matches!(
            load(&[("CAFE_SURCHARGE_KIND", "tip")]),
            Err(ConfigError::InvalidValue(v)) if v == "CAFE_SURCHARGE_KIND"
        ));
        assert!(matches!(
            load(&[("CAFE_SURCHARGE_KIND", "flat")]),
            Err(ConfigError::MissingRequired(v)) if v == "CAFE_SURCHARGE_VALUE"
        ));
        assert!(matches!(
            load(&[("CAFE_SURCHARGE_KIND", "percent"), ("CAFE_SURCHARGE_VALUE", "20000")]),
            Err(ConfigError::InvalidValue(v)) if v == "CAFE_SURCHARGE_VALUE"
        ));
        assert!(matches!(
            load(&[("CAFE_RECEIPT_WIDTH", "10")]),
            Err(ConfigError::InvalidValue(v)) if v == "CAFE_RECEIPT_WIDTH"
        ));
    }

    #[test]
    fn test_blank_secret_disables_auth() {
        let config = load(&[("CAFE_JWT_SECRET", "  ")]).unwrap();
        assert!(config.jwt_secret.is_none());
    }
}
