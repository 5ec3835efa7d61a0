use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::error;
use uuid::Uuid;

use forum_db::{Database, StoreError};
use forum_types::forms::{LoginForm, RegisterForm};

use crate::guard::SESSION_COOKIE;
use crate::session::SessionStore;
use crate::templates::{self, LoginPage, RegisterPage};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionStore,
}

/// One message for a missing user and a wrong password, so the login form
/// cannot be used to enumerate usernames.
const BAD_CREDENTIALS: &str = "invalid username or password";

pub async fn register_form() -> Response {
    templates::render(RegisterPage { error: None })
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, StatusCode> {
    let username = form.username.trim();

    // Validate input; limits are characters, not bytes
    let username_chars = username.chars().count();
    if username_chars < 3 || username_chars > 32 {
        return Ok(templates::render(RegisterPage {
            error: Some("username must be 3 to 32 characters".into()),
        }));
    }
    if form.password.chars().count() < 8 {
        return Ok(templates::render(RegisterPage {
            error: Some("password must be at least 8 characters".into()),
        }));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("password hashing failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .to_string();

    let user_id = Uuid::new_v4();
    match state
        .db
        .create_user(&user_id.to_string(), username, &password_hash)
    {
        Ok(()) => {}
        Err(StoreError::DuplicateUsername) => {
            return Ok(templates::render(RegisterPage {
                error: Some("that username is already taken".into()),
            }));
        }
        Err(e) => {
            error!("create_user failed: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    let token = state.sessions.start(user_id, username);
    Ok((session_cookie(jar, token), Redirect::to("/")).into_response())
}

pub async fn login_form() -> Response {
    templates::render(LoginPage { error: None })
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    let rejected = || {
        Ok(templates::render(LoginPage {
            error: Some(BAD_CREDENTIALS.into()),
        }))
    };

    let user = match state.db.get_user_by_username(form.username.trim()) {
        Ok(Some(row)) => row,
        Ok(None) => return rejected(),
        Err(e) => {
            error!("user lookup failed: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
        error!("stored hash unparseable for '{}': {}", user.username, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if Argon2::default()
        .verify_password(form.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return rejected();
    }

    let user_id: Uuid = user.id.parse().map_err(|e| {
        error!("Corrupt user id '{}': {}", user.id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let token = state.sessions.start(user_id, &user.username);
    Ok((session_cookie(jar, token), Redirect::to("/")).into_response())
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.end(cookie.value());
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/")).into_response()
}

fn session_cookie(jar: CookieJar, token: String) -> CookieJar {
    // No Max-Age: the browser keeps it for the session, the server-side
    // TTL is authoritative either way.
    jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}
