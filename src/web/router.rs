use axum::{
    Router,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use crate::web::{AppState, admin, api, auth, landing};

const ROBOTS_TXT_BODY: &str = include_str!("../../robots.txt");

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::home_page))
        .route("/login", get(auth::login_page))
        .route("/admin", get(admin::dashboard))
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .merge(api::sections::router())
        .merge(api::links::router())
        .merge(api::settings::router())
        .merge(api::stats::router())
        .route("/:slug", get(landing::section_page))
        .with_state(state)
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ROBOTS_TXT_BODY,
    )
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{HeaderMap, Method, Request},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::AppConfig, db::memory_pool, services::auth::hash_password};

    const PASSWORD: &str = "correct horse";

    async fn app() -> Router {
        let config = AppConfig::for_tests(Some(hash_password(PASSWORD, None)));
        build_router(AppState::from_parts(memory_pool().await, config))
    }

    fn request(method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn login(app: &Router) -> String {
        let (status, headers, body) = send(
            app,
            request(Method::POST, "/api/auth/login", Some(json!({ "password": PASSWORD })), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Max-Age=604800"));
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_and_robots() {
        let app = app().await;
        let (status, _, _) = send(&app, request(Method::GET, "/healthz", None, None)).await;
        assert_eq!(status, StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/robots.txt", None, None))
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Disallow: /admin"));
    }

    #[tokio::test]
    async fn writes_require_a_session_but_reads_do_not() {
        let app = app().await;

        let (status, _, body) = send(
            &app,
            request(Method::POST, "/api/sections", Some(json!({ "title": "A", "slug": "a" })), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "success": false, "error": "Unauthorized" }));

        let (status, _, _) = send(
            &app,
            request(Method::GET, "/api/stats", None, Some("admin_session=admin:1:forged")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, body) = send(&app, request(Method::GET, "/api/sections", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": [] }));

        let (status, _, body) = send(&app, request(Method::GET, "/api/settings", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["site_title"], "My Links");
    }

    #[tokio::test]
    async fn failed_logins_report_attempts_then_lock() {
        let app = app().await;
        let wrong = || {
            let mut req = request(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "password": "nope" })),
                None,
            );
            req.headers_mut()
                .insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
            req
        };

        let (status, _, body) = send(&app, wrong()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid password. 4 attempts remaining.");

        for _ in 0..3 {
            send(&app, wrong()).await;
        }
        let (_, _, body) = send(&app, wrong()).await;
        assert_eq!(body["error"], "Invalid password. Account temporarily locked.");

        let (status, headers, body) = send(&app, wrong()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many attempts. Try again in 30 minutes.");
        let retry: i64 = headers[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!(retry > 0);

        let (status, _, body) = send(
            &app,
            request(Method::POST, "/api/auth/login", Some(json!({})), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Password required");
    }

    #[tokio::test]
    async fn order_conflict_needs_confirmation() {
        let app = app().await;
        let cookie = login(&app).await;
        let cookie = Some(cookie.as_str());

        for (title, slug, order) in [("First", "first", 1), ("Second", "second", 2)] {
            let (status, _, body) = send(
                &app,
                request(
                    Method::POST,
                    "/api/sections",
                    Some(json!({ "title": title, "slug": slug, "display_order": order })),
                    cookie,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["data"]["show_in_main"], true);
        }

        let (status, _, body) = send(
            &app,
            request(Method::PUT, "/api/sections/1", Some(json!({ "display_order": 2 })), cookie),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["warning"], true);
        assert_eq!(body["currentOrder"], 1);
        assert_eq!(body["conflictWith"]["title"], "Second");
        assert_eq!(
            body["message"],
            "Display order 2 is already used by \"Second\". Confirm to swap orders."
        );

        let (status, _, body) = send(
            &app,
            request(
                Method::PUT,
                "/api/sections/1",
                Some(json!({ "display_order": 2, "confirmSwap": true })),
                cookie,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["display_order"], 2);

        let (_, _, body) = send(&app, request(Method::GET, "/api/sections/2", None, None)).await;
        assert_eq!(body["data"]["display_order"], 1);

        let (status, _, body) = send(
            &app,
            request(Method::PUT, "/api/sections/1", Some(json!({ "slug": "Bad Slug!" })), cookie),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _, body) = send(&app, request(Method::GET, "/api/sections/abc", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Section not found");
    }

    #[tokio::test]
    async fn links_pages_and_clicks() {
        let app = app().await;
        let cookie = login(&app).await;
        let cookie = Some(cookie.as_str());

        send(
            &app,
            request(Method::POST, "/api/sections", Some(json!({ "title": "blog", "slug": "blog" })), cookie),
        )
        .await;

        let (status, _, body) = send(
            &app,
            request(
                Method::POST,
                "/api/links",
                Some(json!({ "section_id": 1, "label": "Blog", "url": "https://example.com" })),
                cookie,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["is_visible"], true);
        assert_eq!(body["data"]["display_order"], 0);

        let (status, _, body) = send(
            &app,
            request(
                Method::POST,
                "/api/links",
                Some(json!({ "section_id": 1, "label": "Bad", "url": "javascript:alert(1)" })),
                cookie,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid URL. Must be http, https, mailto, or tel protocol."
        );

        let (status, _, body) = send(
            &app,
            request(Method::POST, "/api/links/1/click", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let mut clicks = Value::Null;
        for _ in 0..50 {
            let (_, _, body) = send(&app, request(Method::GET, "/api/links/1", None, None)).await;
            clicks = body["data"]["clicks"].clone();
            if clicks == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(clicks, 1);

        let (_, _, body) = send(
            &app,
            request(Method::GET, "/api/links?sectionId=1&visibleOnly=true", None, None),
        )
        .await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/blog", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&html);
        assert!(html.contains("Blog"));
        assert!(html.contains(r#"<div class="avatar">B</div>"#));

        let (status, _, _) = send(&app, request(Method::GET, "/missing", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = send(&app, request(Method::GET, "/api/stats", None, cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalClicks"], 1);

        let (status, _, body) = send(
            &app,
            request(Method::DELETE, "/api/sections/1", None, cookie),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({ "deleted": true }));

        let (status, _, _) = send(&app, request(Method::GET, "/api/links/1", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_page_redirects_without_session() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/admin", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");

        let cookie = login(&app).await;
        let response = app
            .clone()
            .oneshot(request(Method::GET, "/admin", None, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, headers, body) = send(
            &app,
            request(Method::POST, "/api/auth/logout", None, Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        assert!(headers[header::SET_COOKIE].to_str().unwrap().contains("admin_session="));
    }

    async fn page(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(request(Method::GET, uri, None, None))
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn home_lists_main_sections_under_site_profile() {
        let app = app().await;

        let (status, html) = page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"<div class="avatar">M</div>"#));
        assert!(html.contains("My Links"));
        assert!(html.contains("No sections available yet."));

        let cookie = login(&app).await;
        let cookie = Some(cookie.as_str());
        for (title, slug, order, show) in [
            ("Second", "second", 2, true),
            ("Hidden", "hidden", 0, false),
            ("First", "first", 1, true),
        ] {
            let (status, _, _) = send(
                &app,
                request(
                    Method::POST,
                    "/api/sections",
                    Some(json!({
                        "title": title,
                        "slug": slug,
                        "display_order": order,
                        "show_in_main": show,
                    })),
                    cookie,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, _, _) = send(
            &app,
            request(
                Method::PUT,
                "/api/settings",
                Some(json!({
                    "site_title": "Ada Lovelace",
                    "site_description": "Notes & engines",
                    "profile_initial": "a",
                })),
                cookie,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, html) = page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<title>Ada Lovelace</title>"));
        assert!(html.contains("<p>Notes &amp; engines</p>"));
        assert!(html.contains(r#"<div class="avatar">A</div>"#));
        assert!(!html.contains(r#"href="/hidden""#));

        let first = html.find(r#"href="/first""#).unwrap();
        let second = html.find(r#"href="/second""#).unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_error_envelope() {
        let app = app().await;

        let bad_json = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = send(&app, bad_json).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "error": "Invalid JSON body" }));

        let no_content_type = Request::builder()
            .method(Method::POST)
            .uri("/api/sections")
            .body(Body::from(r#"{"title":"A","slug":"a"}"#))
            .unwrap();
        let (status, _, body) = send(&app, no_content_type).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid JSON body");
    }
}
