use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;
use uuid::Uuid;

use forum_db::StoreError;
use forum_types::forms::NewPostForm;
use forum_types::models::SessionUser;

use crate::auth::AppState;
use crate::threads;

const MAX_POST_LEN: usize = 5000;

pub async fn create_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<NewPostForm>,
) -> Result<Response, StatusCode> {
    let Ok(thread_id) = id.parse::<Uuid>() else {
        return Ok(Redirect::to("/").into_response());
    };

    let content = form.content.trim().to_string();
    if content.is_empty() || content.chars().count() > MAX_POST_LEN {
        return threads::thread_page(
            &state,
            thread_id,
            Some(user.username),
            Some("post must be 1 to 5000 characters".into()),
        )
        .await;
    }

    let post_id = Uuid::new_v4();
    let db = state.clone();
    let author_id = user.id.to_string();
    let result = tokio::task::spawn_blocking(move || {
        db.db
            .create_post(&post_id.to_string(), &thread_id.to_string(), &author_id, &content)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match result {
        Ok(()) => Ok(Redirect::to(&format!("/thread/{}", thread_id)).into_response()),
        // The thread vanished (or never existed): back to the index.
        Err(StoreError::UnknownThread) => Ok(Redirect::to("/").into_response()),
        Err(e) => {
            error!("create_post failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
