//! Environment-driven configuration.

use std::env;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::Duration;

use erpguard_auth::LockoutPolicy;
use erpguard_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSuperuser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub lockout: LockoutPolicy,
    pub bootstrap_superuser: Option<BootstrapSuperuser>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Defaults for everything except the signing secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::minutes(60),
            lockout: LockoutPolicy::default(),
            bootstrap_superuser: None,
            log_format: LogFormat::Json,
        }
    }

    pub fn with_bootstrap_superuser(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.bootstrap_superuser = Some(BootstrapSuperuser {
            email: email.into(),
            password: password.into(),
        });
        self
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new(DEV_JWT_SECRET);

        let ttl_minutes: i64 = parse_env("ACCESS_TOKEN_TTL_MINUTES", 60)?;
        let attempts: u32 = parse_env("ACCOUNT_LOCKOUT_ATTEMPTS", LockoutPolicy::DEFAULT_MAX_ATTEMPTS)?;
        let lock_seconds: i64 = parse_env("ACCOUNT_LOCKOUT_SECONDS", LockoutPolicy::DEFAULT_LOCK_SECONDS)?;
        if attempts == 0 {
            return Err(anyhow!("ACCOUNT_LOCKOUT_ATTEMPTS must be at least 1"));
        }

        let bootstrap_superuser = match (
            env::var("BOOTSTRAP_SUPERUSER_EMAIL").ok(),
            env::var("BOOTSTRAP_SUPERUSER_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapSuperuser { email, password })
            }
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "BOOTSTRAP_SUPERUSER_EMAIL and BOOTSTRAP_SUPERUSER_PASSWORD must be set together"
                ));
            }
        };

        Ok(Self {
            bind_addr: get_env("BIND_ADDR", &defaults.bind_addr),
            jwt_secret: get_env("JWT_SECRET", DEV_JWT_SECRET),
            access_token_ttl: positive_duration("ACCESS_TOKEN_TTL_MINUTES", ttl_minutes, Duration::try_minutes)?,
            lockout: LockoutPolicy::new(
                attempts,
                positive_duration("ACCOUNT_LOCKOUT_SECONDS", lock_seconds, Duration::try_seconds)?,
            ),
            bootstrap_superuser,
            log_format: LogFormat::parse(&get_env("LOG_FORMAT", "json")),
        })
    }

    /// Call once logging is up.
    pub fn warn_on_insecure_defaults(&self) {
        if self.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

/// Longest token lifetime or lockout window accepted from the environment.
const MAX_CONFIGURED_DAYS: i64 = 3650;

/// Rejects zero, negative and out-of-range values.
fn positive_duration(key: &str, value: i64, unit: fn(i64) -> Option<Duration>) -> anyhow::Result<Duration> {
    if value <= 0 {
        return Err(anyhow!("{key} must be positive, got {value}"));
    }
    unit(value)
        .filter(|d| *d <= Duration::days(MAX_CONFIGURED_DAYS))
        .ok_or_else(|| anyhow!("{key} is out of range: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::new("s3cret");
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.access_token_ttl, Duration::minutes(60));
        assert_eq!(cfg.lockout.max_attempts, 5);
        assert_eq!(cfg.lockout.lock_duration, Duration::seconds(300));
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.bootstrap_superuser.is_none());
    }

    #[test]
    fn durations_must_be_positive_and_in_range() {
        let ok = positive_duration("ACCOUNT_LOCKOUT_SECONDS", 300, Duration::try_seconds).unwrap();
        assert_eq!(ok, Duration::seconds(300));

        for bad in [0, -300] {
            let err = positive_duration("ACCOUNT_LOCKOUT_SECONDS", bad, Duration::try_seconds).unwrap_err();
            assert!(err.to_string().contains("must be positive"));
        }

        for huge in [i64::MAX, 10_000_000] {
            let err = positive_duration("ACCESS_TOKEN_TTL_MINUTES", huge, Duration::try_minutes).unwrap_err();
            assert!(err.to_string().contains("out of range"));
        }
    }

    #[test]
    fn unset_numeric_key_falls_back() {
        let value: u32 = parse_env("ERPGUARD_TEST_SURELY_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }
}
