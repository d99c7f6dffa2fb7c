pub mod links;
pub mod sections;
pub mod settings;
pub mod stats;

use serde_json::{Map, Value};

use crate::{utils::validation::truthy, web::responses::ApiError};

/// Path ids that are not integers can never match a row.
fn parse_id(raw: &str, not_found: &'static str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::not_found(not_found))
}

/// Reads and removes the `confirmSwap` flag from an update body.
fn take_confirm_swap(body: &mut Map<String, Value>) -> bool {
    body.remove("confirmSwap").is_some_and(|value| truthy(&value))
}
