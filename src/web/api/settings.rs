use axum::{Router, extract::State, routing::get};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Map, Value};

use crate::{
    services::settings,
    utils::validation::validate_settings_data,
    web::{
        AppState,
        auth::require_admin,
        responses::{self, ApiJson, ApiResult},
    },
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings", get(show).put(update))
}

async fn show(State(state): State<AppState>) -> ApiResult {
    Ok(responses::ok(settings::load(state.pool_ref()).await?))
}

async fn update(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult {
    require_admin(&state, &jar)?;

    let patch = validate_settings_data(&body)?;
    Ok(responses::ok(settings::update(state.pool_ref(), patch).await?))
}
