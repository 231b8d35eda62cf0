use crate::domain::{Decimal, UserId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Flat fee attached to ship-to-me items.
    pub ship_to_me_fee: Decimal,
    /// Demo identity served a fixed balance when the ledger is empty or
    /// unreachable. Optional; production deployments leave it unset.
    pub demo_user_id: Option<UserId>,
    pub demo_balance: i64,
    /// Large cap on ledger entries fetched per balance query.
    pub ledger_query_cap: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let ship_to_me_fee = Decimal::from_str_canonical(
            env_map
                .get("SHIP_TO_ME_FEE")
                .map(|s| s.as_str())
                .unwrap_or("4.99"),
        )
        .map_err(|_| {
            ConfigError::InvalidValue(
                "SHIP_TO_ME_FEE".to_string(),
                "must be a valid decimal".to_string(),
            )
        })?;
        if ship_to_me_fee.is_negative() {
            return Err(ConfigError::InvalidValue(
                "SHIP_TO_ME_FEE".to_string(),
                "must be non-negative".to_string(),
            ));
        }

        let demo_user_id = env_map
            .get("DEMO_USER_ID")
            .filter(|s| !s.is_empty())
            .map(|s| UserId::new(s.clone()));

        let demo_balance = env_map
            .get("DEMO_BALANCE")
            .map(|s| s.as_str())
            .unwrap_or("0")
            .parse::<i64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "DEMO_BALANCE".to_string(),
                    "must be a valid i64".to_string(),
                )
            })?;

        let ledger_query_cap = env_map
            .get("LEDGER_QUERY_CAP")
            .map(|s| s.as_str())
            .unwrap_or("10000")
            .parse::<u32>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "LEDGER_QUERY_CAP".to_string(),
                    "must be a valid u32".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            ship_to_me_fee,
            demo_user_id,
            demo_balance,
            ledger_query_cap,
        })
    }
}
