use axum::{
    Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    services::links::{self, LinkFilter, NewLink},
    utils::validation::{parse_positive_int_str, validate_link_data},
    web::{
        AppState,
        auth::require_admin,
        responses::{self, ApiJson, ApiResult},
    },
};

use super::{parse_id, take_confirm_swap};

const NOT_FOUND: &str = "Link not found";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/links", get(list).post(create))
        .route("/api/links/:id", get(show).put(update).delete(destroy))
        .route("/api/links/:id/click", post(click))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkListQuery {
    pub section_id: Option<String>,
    pub visible_only: Option<String>,
}

impl LinkListQuery {
    fn filter(&self) -> LinkFilter {
        let section_id = self
            .section_id
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_positive_int_str(raw, -1))
            .filter(|id| *id >= 0);

        LinkFilter {
            section_id,
            visible_only: self.visible_only.as_deref() == Some("true"),
        }
    }
}

async fn list(State(state): State<AppState>, Query(query): Query<LinkListQuery>) -> ApiResult {
    let found = links::find_all(state.pool_ref(), query.filter()).await?;
    Ok(responses::ok(found))
}

async fn show(State(state): State<AppState>, Path(raw_id): Path<String>) -> ApiResult {
    let id = parse_id(&raw_id, NOT_FOUND)?;
    Ok(responses::ok(links::find_by_id(state.pool_ref(), id).await?))
}

async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult {
    require_admin(&state, &jar)?;

    let data = NewLink::try_from(validate_link_data(&body)?)?;
    let created = links::create(state.pool_ref(), data).await?;
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
    let patch = validate_link_data(&body)?;
    let outcome = links::update(state.pool_ref(), id, patch, confirm_swap).await?;
    Ok(responses::updated(outcome))
}

async fn destroy(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(raw_id): Path<String>,
) -> ApiResult {
    require_admin(&state, &jar)?;

    let id = parse_id(&raw_id, NOT_FOUND)?;
    Ok(responses::ok(links::delete(state.pool_ref(), id).await?))
}

/// Always succeeds; the counter is bumped in the background.
async fn click(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    if let Ok(id) = raw_id.trim().parse::<i64>() {
        links::track_click(state.pool(), id);
    }
    responses::done()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(section_id: Option<&str>, visible_only: Option<&str>) -> LinkListQuery {
        LinkListQuery {
            section_id: section_id.map(str::to_string),
            visible_only: visible_only.map(str::to_string),
        }
    }

    #[test]
    fn list_filters_parse_leniently() {
        assert_eq!(query(None, None).filter(), LinkFilter::default());
        assert_eq!(query(Some("3"), Some("true")).filter().section_id, Some(3));
        assert!(query(Some("3"), Some("true")).filter().visible_only);
        assert_eq!(query(Some("0"), None).filter().section_id, Some(0));
        assert_eq!(query(Some("-2"), None).filter().section_id, None);
        assert_eq!(query(Some("abc"), None).filter().section_id, None);
        assert!(!query(None, Some("1")).filter().visible_only);
    }
}
