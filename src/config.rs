use std::{env, str::FromStr};

use anyhow::{Context, Result};
use chrono::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://linkpage.db";
const DEFAULT_PORT: u16 = 8080;

/// Failed-login throttling parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoginLimits {
    pub max_attempts: i64,
    pub window: Duration,
    pub lockout: Duration,
}

impl Default for LoginLimits {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(15),
            lockout: Duration::minutes(30),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
    Other(String),
}

impl RunMode {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "production" | "prod" => Self::Production,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub admin_password_hash: Option<String>,
    pub run_mode: RunMode,
    pub login_limits: LoginLimits,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let port = parse_env_or("PORT", DEFAULT_PORT)?;

        let admin_password_hash = env::var("ADMIN_PASSWORD_HASH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let run_mode = env::var("APP_ENV")
            .map(|raw| RunMode::parse(&raw))
            .unwrap_or(RunMode::Production);

        let defaults = LoginLimits::default();
        let login_limits = LoginLimits {
            max_attempts: i64::from(parse_positive_env(
                "LOGIN_MAX_ATTEMPTS",
                defaults.max_attempts,
            )?),
            window: Duration::minutes(i64::from(parse_positive_env(
                "LOGIN_WINDOW_MINUTES",
                defaults.window.num_minutes(),
            )?)),
            lockout: Duration::minutes(i64::from(parse_positive_env(
                "LOGIN_LOCKOUT_MINUTES",
                defaults.lockout.num_minutes(),
            )?)),
        };

        Ok(Self {
            database_url,
            port,
            admin_password_hash,
            run_mode,
            login_limits,
        })
    }

    /// Authentication bypass. Only honoured by debug builds running with `APP_ENV=development`.
    pub fn auth_bypass(&self) -> bool {
        cfg!(debug_assertions) && self.run_mode == RunMode::Development
    }

    pub fn secure_cookies(&self) -> bool {
        self.run_mode == RunMode::Production
    }
}

fn parse_positive_env(key: &str, default: i64) -> Result<u32> {
    let fallback = u32::try_from(default).with_context(|| format!("{key} default out of range"))?;
    parse_positive(key, env::var(key).ok().as_deref(), fallback)
}

/// Counts and minute values: parsed as `u32` so they can neither be negative nor
/// overflow a duration, and zero is refused.
fn parse_positive(key: &str, raw: Option<&str>, default: u32) -> Result<u32> {
    let value = match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("{key} has an invalid value: {raw}"))?,
        None => default,
    };
    anyhow::ensure!(value > 0, "{key} must be at least 1");
    Ok(value)
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests(admin_password_hash: Option<String>) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            admin_password_hash,
            run_mode: RunMode::Other("test".to_string()),
            login_limits: LoginLimits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_mode_parses_common_spellings() {
        assert_eq!(RunMode::parse("Development"), RunMode::Development);
        assert_eq!(RunMode::parse(" prod "), RunMode::Production);
        assert_eq!(
            RunMode::parse("staging"),
            RunMode::Other("staging".to_string())
        );
    }

    #[test]
    fn bypass_requires_development_mode() {
        let mut config = AppConfig::for_tests(None);
        assert!(!config.auth_bypass());

        config.run_mode = RunMode::Production;
        assert!(!config.auth_bypass());
        assert!(config.secure_cookies());

        config.run_mode = RunMode::Development;
        assert_eq!(config.auth_bypass(), cfg!(debug_assertions));
        assert!(!config.secure_cookies());
    }

    #[test]
    fn login_limits_must_be_small_positive_integers() {
        assert_eq!(parse_positive("LOGIN_WINDOW_MINUTES", None, 15).unwrap(), 15);
        assert_eq!(parse_positive("LOGIN_WINDOW_MINUTES", Some("  "), 15).unwrap(), 15);
        assert_eq!(parse_positive("LOGIN_WINDOW_MINUTES", Some(" 60 "), 15).unwrap(), 60);

        for raw in ["-5", "0", "99999999999999", "ten"] {
            let err = parse_positive("LOGIN_LOCKOUT_MINUTES", Some(raw), 30).unwrap_err();
            assert!(err.to_string().contains("LOGIN_LOCKOUT_MINUTES"), "{raw}: {err}");
        }
    }
}
