pub mod auth;
pub mod links;
pub mod ordering;
pub mod patch;
pub mod sections;
pub mod settings;
pub mod stats;

use serde::Serialize;
use thiserror::Error;

/// Hard failures of a service call. Database details stay in the logs; the
/// client only sees the generic message carried alongside.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}: {source}")]
    Database {
        message: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl ServiceError {
    pub fn database(message: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Database { message, source }
    }
}

/// Soft failure: the requested display order is taken and the caller must
/// re-submit with confirmation to swap.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwapWarning<T> {
    pub message: String,
    pub conflict_with: T,
    pub current_order: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Updated<T> {
    Applied(T),
    NeedsConfirmation(SwapWarning<T>),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Deleted {
    pub deleted: bool,
}
