use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration as CookieDuration;
use serde_json::{Map, Value};

use crate::{
    services::auth::{self, LoginError, SESSION_COOKIE, SESSION_TTL_DAYS},
    web::{
        AppState, render_login_page,
        responses::{self, ApiError, ApiJson},
    },
};

/// True when the request carries a valid session cookie, or when the
/// development bypass is active.
pub fn is_authenticated(state: &AppState, jar: &CookieJar) -> bool {
    let config = state.config();
    if config.auth_bypass() {
        return true;
    }

    let Some(password_hash) = config.admin_password_hash.as_deref() else {
        return false;
    };

    jar.get(SESSION_COOKIE).is_some_and(|cookie| {
        auth::verify_session_token(cookie.value(), password_hash, auth::now_millis())
    })
}

pub fn require_admin(state: &AppState, jar: &CookieJar) -> Result<(), ApiError> {
    if is_authenticated(state, jar) {
        Ok(())
    } else {
        Err(ApiError::unauthorized())
    }
}

/// Client address used as the rate-limit key.
pub fn client_ip(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header("cf-connecting-ip")
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|forwarded| forwarded.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
        .or_else(|| header("x-real-ip"))
        .unwrap_or("unknown")
        .to_string()
}

pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if is_authenticated(&state, &jar) {
        return Redirect::to("/admin").into_response();
    }

    Html(render_login_page()).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> Result<(CookieJar, Response), Response> {
    let ip = client_ip(&headers);
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");
    let config = state.config();

    let token = auth::login(
        state.pool_ref(),
        config.admin_password_hash.as_deref(),
        &config.login_limits,
        password,
        &ip,
        auth::now_millis(),
    )
    .await
    .map_err(login_error_response)?;

    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.secure_cookies());
    cookie.set_max_age(CookieDuration::days(SESSION_TTL_DAYS));

    Ok((jar.add(cookie), responses::done()))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Response) {
    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_http_only(true);
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));

    (jar.remove(removal), responses::done())
}

fn login_error_response(err: LoginError) -> Response {
    let status = match err {
        LoginError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        LoginError::PasswordRequired => StatusCode::BAD_REQUEST,
        LoginError::InvalidPassword { .. } | LoginError::Locked => StatusCode::UNAUTHORIZED,
        LoginError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut response = ApiError::new(status, err.to_string()).into_response();
    if let LoginError::RateLimited {
        retry_after_seconds,
        ..
    } = err
    {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_seconds));
    }
    response
}
