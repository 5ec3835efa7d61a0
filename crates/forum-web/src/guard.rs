use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use forum_types::models::SessionUser;

use crate::auth::AppState;

pub const SESSION_COOKIE: &str = "forum_session";

/// Resolve the session cookie on a request, if any, to the logged-in user.
pub fn current_user(state: &AppState, jar: &CookieJar) -> Option<SessionUser> {
    let cookie = jar.get(SESSION_COOKIE)?;
    state.sessions.resolve(cookie.value())
}

/// Access guard for protected routes: without a valid session the request
/// is redirected to the login page before any handler runs.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Redirect> {
    let jar = CookieJar::from_headers(req.headers());
    let Some(user) = current_user(&state, &jar) else {
        return Err(Redirect::to("/login"));
    };

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
