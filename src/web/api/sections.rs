use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    services::sections::{self, NewSection},
    utils::validation::validate_section_data,
    web::{
        AppState,
        auth::require_admin,
        responses::{self, ApiJson, ApiResult},
    },
};

use super::{parse_id, take_confirm_swap};

const NOT_FOUND: &str = "Section not found";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sections", get(list).post(create))
        .route(
            "/api/sections/:id",
            get(show).put(update).delete(destroy),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionListQuery {
    pub main_only: Option<String>,
}

async fn list(State(state): State<AppState>, Query(query): Query<SectionListQuery>) -> ApiResult {
    let main_only = query.main_only.as_deref() == Some("true");
    let found = sections::find_all(state.pool_ref(), main_only).await?;
    Ok(responses::ok(found))
}

async fn show(State(state): State<AppState>, Path(raw_id): Path<String>) -> ApiResult {
    let id = parse_id(&raw_id, NOT_FOUND)?;
    Ok(responses::ok(sections::find_by_id(state.pool_ref(), id).await?))
}

async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult {
    require_admin(&state, &jar)?;

    let data = NewSection::try_from(validate_section_data(&body)?)?;
    let created = sections::create(state.pool_ref(), data).await?;
    Ok(responses::created(created))
}

async fn update(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(raw_id): Path<String>,
    ApiJson(mut body): ApiJson<Map<String, Value>>,
) -> ApiResult {
    require_admin(&state, &jar)?;

    let id = parse_id(&raw_id, NOT_FOUND)?;
    let confirm_swap = take_confirm_swap(&mut body);
    let patch = validate_section_data(&body)?;
    let outcome = sections::update(state.pool_ref(), id, patch, confirm_swap).await?;
    Ok(responses::updated(outcome))
}

async fn destroy(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(raw_id): Path<String>,
) -> ApiResult {
    require_admin(&state, &jar)?;

    let id = parse_id(&raw_id, NOT_FOUND)?;
    Ok(responses::ok(sections::delete(state.pool_ref(), id).await?))
}
