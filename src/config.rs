use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

const DEFAULT_JWT_SECRET: &str = "tu_secreto_jwt";

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub port: u16,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using the built-in development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        Self {
            database_url,
            jwt_secret,
            port: try_load("PORT", 5001),
            token_ttl_days: try_load("JWT_EXPIRES_DAYS", 30),
            bcrypt_cost: try_load("BCRYPT_COST", bcrypt::DEFAULT_COST),
        }
    }

    /// Configuration for tests and tooling: no database, fixed secret.
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            port: 0,
            token_ttl_days: 30,
            bcrypt_cost: 4,
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_numbers_fall_back_to_default() {
        env::set_var("SELLSYNC_TEST_PORT", "not-a-port");
        assert_eq!(try_load::<u16>("SELLSYNC_TEST_PORT", 5001), 5001);

        env::set_var("SELLSYNC_TEST_PORT", " 8080 ");
        assert_eq!(try_load::<u16>("SELLSYNC_TEST_PORT", 5001), 8080);
        env::remove_var("SELLSYNC_TEST_PORT");
    }

    #[test]
    fn missing_variable_uses_default() {
        assert_eq!(try_load::<i64>("SELLSYNC_TEST_UNSET_TTL", 30), 30);
    }
}
