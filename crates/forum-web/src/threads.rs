use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;
use uuid::Uuid;

use forum_db::StoreError;
use forum_types::forms::NewThreadForm;
use forum_types::models::SessionUser;

use crate::auth::AppState;
use crate::guard;
use crate::templates::{self, IndexPage, NewThreadPage, ThreadPage};

const MAX_TITLE_LEN: usize = 200;

/// Thread index, newest first. Public; the nav reflects login state.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Result<Response, StatusCode> {
    let user = guard::current_user(&state, &jar);

    // Run the blocking DB query off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_threads())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("list_threads failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(templates::render(IndexPage {
        user: user.map(|u| u.username),
        threads: rows.into_iter().map(templates::thread_view).collect(),
    }))
}

pub async fn new_thread_form(Extension(user): Extension<SessionUser>) -> Response {
    templates::render(NewThreadPage {
        user: user.username,
        error: None,
    })
}

pub async fn create_thread(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<NewThreadForm>,
) -> Result<Response, StatusCode> {
    let title = form.title.trim().to_string();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Ok(templates::render(NewThreadPage {
            user: user.username,
            error: Some("title must be 1 to 200 characters".into()),
        }));
    }

    let thread_id = Uuid::new_v4();
    let db = state.clone();
    let author_id = user.id.to_string();
    tokio::task::spawn_blocking(move || {
        db.db.create_thread(&thread_id.to_string(), &title, &author_id)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("create_thread failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Redirect::to(&format!("/thread/{}", thread_id)).into_response())
}

pub async fn show_thread(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Response, StatusCode> {
    // A malformed id gets the same treatment as an unknown one.
    let Ok(thread_id) = id.parse::<Uuid>() else {
        return Ok(Redirect::to("/").into_response());
    };

    let user = guard::current_user(&state, &jar);
    thread_page(&state, thread_id, user.map(|u| u.username), None).await
}

/// Render the thread page, or redirect to the index when the thread does
/// not exist. Shared with the post handler so a rejected post can
/// re-render the page with an inline error.
pub(crate) async fn thread_page(
    state: &AppState,
    thread_id: Uuid,
    user: Option<String>,
    error_msg: Option<String>,
) -> Result<Response, StatusCode> {
    let db = state.clone();
    let tid = thread_id.to_string();
    let (thread, posts) = tokio::task::spawn_blocking(move || {
        let thread = db.db.get_thread(&tid)?;
        let posts = db.db.list_posts(&tid)?;
        Ok::<_, StoreError>((thread, posts))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("thread lookup failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let Some(thread) = thread else {
        // Unknown thread: back to the index rather than a visible 404.
        return Ok(Redirect::to("/").into_response());
    };

    Ok(templates::render(ThreadPage {
        user,
        thread: templates::thread_view(thread),
        posts: posts.into_iter().map(templates::post_view).collect(),
        error: error_msg,
    }))
}
