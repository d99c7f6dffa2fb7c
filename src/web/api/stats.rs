use axum::{Router, extract::State, routing::get};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    services::stats,
    web::{
        AppState,
        auth::require_admin,
        responses::{self, ApiResult},
    },
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/stats", get(dashboard))
}

async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> ApiResult {
    require_admin(&state, &jar)?;
    Ok(responses::ok(stats::dashboard(state.pool_ref()).await?))
}
