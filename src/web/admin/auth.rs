use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;

use crate::web::{AppState, auth::is_authenticated};

/// Page-level gate: unauthenticated visitors are sent to the login form.
pub fn require_admin_page(state: &AppState, jar: &CookieJar) -> Result<(), Redirect> {
    if is_authenticated(state, jar) {
        Ok(())
    } else {
        Err(Redirect::to("/login"))
    }
}
