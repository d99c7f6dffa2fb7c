//! Admin password check, stateless session tokens and the persisted login
//! rate limiter.
//!
//! The stored credential is `salt:hexsha256(salt + password)`. Session tokens
//! are `admin:{expiry_millis}:{hex hmac}` keyed by that stored credential, so
//! rotating the password hash revokes every outstanding session.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::LoginLimits;

pub const SESSION_COOKIE: &str = "admin_session";
pub const SESSION_TTL_DAYS: i64 = 7;

const SESSION_SUBJECT: &str = "admin";

type HmacSha256 = Hmac<Sha256>;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Hashes `password` with `salt`, or with a fresh random salt when none is given.
pub fn hash_password(password: &str, salt: Option<&str>) -> String {
    let salt = salt.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    format!("{salt}:{}", hex::encode(digest))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Some(salt) = stored_hash.split(':').next().filter(|salt| !salt.is_empty()) else {
        return false;
    };

    constant_time_eq(&hash_password(password, Some(salt)), stored_hash)
}

pub fn create_session_token(password_hash: &str, now_ms: i64) -> Option<String> {
    let expires = now_ms + chrono::Duration::days(SESSION_TTL_DAYS).num_milliseconds();
    let payload = format!("{SESSION_SUBJECT}:{expires}");
    let signature = sign(&payload, password_hash)?;
    Some(format!("{payload}:{signature}"))
}

pub fn verify_session_token(token: &str, password_hash: &str, now_ms: i64) -> bool {
    let parts: Vec<&str> = token.split(':').collect();
    let [subject, expires_raw, signature] = parts.as_slice() else {
        return false;
    };

    let Ok(expires) = expires_raw.parse::<i64>() else {
        return false;
    };
    if now_ms > expires {
        return false;
    }

    sign(&format!("{subject}:{expires_raw}"), password_hash)
        .is_some_and(|expected| constant_time_eq(signature, &expected))
}

fn sign(payload: &str, key: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(left: &str, right: &str) -> bool {
    left.len() == right.len() && bool::from(left.as_bytes().ct_eq(right.as_bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub allowed: bool,
    pub remaining_attempts: i64,
    pub retry_after_seconds: Option<i64>,
}

/// Prunes expired attempts, then decides whether `ip` may try again.
pub async fn check_rate_limit(
    pool: &SqlitePool,
    ip: &str,
    limits: &LoginLimits,
    now_ms: i64,
) -> sqlx::Result<RateLimit> {
    let lockout_ms = limits.lockout.num_milliseconds();
    let window_start = now_ms - limits.window.num_milliseconds();

    prune_attempts(pool, now_ms - lockout_ms).await?;

    let (count, last_attempt): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(timestamp) FROM login_attempts WHERE ip = ? AND timestamp > ?",
    )
    .bind(ip)
    .bind(window_start)
    .fetch_one(pool)
    .await?;

    if count < limits.max_attempts {
        return Ok(RateLimit {
            allowed: true,
            remaining_attempts: limits.max_attempts - count,
            retry_after_seconds: None,
        });
    }

    let lockout_end = last_attempt.unwrap_or(0) + lockout_ms;
    if now_ms < lockout_end {
        return Ok(RateLimit {
            allowed: false,
            remaining_attempts: 0,
            retry_after_seconds: Some((lockout_end - now_ms + 999) / 1000),
        });
    }

    clear_attempts(pool, ip).await?;
    Ok(RateLimit {
        allowed: true,
        remaining_attempts: limits.max_attempts,
        retry_after_seconds: None,
    })
}

pub async fn record_failed_attempt(pool: &SqlitePool, ip: &str, now_ms: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO login_attempts (ip, timestamp) VALUES (?, ?)")
        .bind(ip)
        .bind(now_ms)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear_attempts(pool: &SqlitePool, ip: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM login_attempts WHERE ip = ?")
        .bind(ip)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes attempts recorded before `cutoff_ms` and returns how many went.
pub async fn prune_attempts(pool: &SqlitePool, cutoff_ms: i64) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM login_attempts WHERE timestamp < ?")
        .bind(cutoff_ms)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Too many attempts. Try again in {retry_after_minutes} minutes.")]
    RateLimited {
        retry_after_seconds: i64,
        retry_after_minutes: i64,
    },

    #[error("Password required")]
    PasswordRequired,

    #[error("Invalid password. {remaining} attempts remaining.")]
    InvalidPassword { remaining: i64 },

    #[error("Invalid password. Account temporarily locked.")]
    Locked,

    #[error("Login failed")]
    Internal,
}

/// Runs one login attempt for `ip` and returns a fresh session token on success.
///
/// With no configured hash every password is wrong, and still counts against
/// the rate limit.
pub async fn login(
    pool: &SqlitePool,
    password_hash: Option<&str>,
    limits: &LoginLimits,
    password: &str,
    ip: &str,
    now_ms: i64,
) -> Result<String, LoginError> {
    let internal = |err: sqlx::Error| {
        error!(?err, ip, "login failed on storage error");
        LoginError::Internal
    };

    let rate_limit = check_rate_limit(pool, ip, limits, now_ms)
        .await
        .map_err(internal)?;

    if !rate_limit.allowed {
        let retry_after_seconds = rate_limit.retry_after_seconds.unwrap_or(0);
        warn!(ip, retry_after_seconds, "login rejected by rate limiter");
        return Err(LoginError::RateLimited {
            retry_after_seconds,
            retry_after_minutes: (retry_after_seconds + 59) / 60,
        });
    }

    if password.is_empty() {
        return Err(LoginError::PasswordRequired);
    }

    let token = password_hash
        .filter(|hash| verify_password(password, hash))
        .and_then(|hash| create_session_token(hash, now_ms));

    let Some(token) = token else {
        record_failed_attempt(pool, ip, now_ms)
            .await
            .map_err(internal)?;
        let remaining = rate_limit.remaining_attempts - 1;
        warn!(ip, remaining, "invalid admin password");
        return Err(if remaining > 0 {
            LoginError::InvalidPassword { remaining }
        } else {
            LoginError::Locked
        });
    };

    clear_attempts(pool, ip).await.map_err(internal)?;
    info!(ip, "admin logged in");
    Ok(token)
}
