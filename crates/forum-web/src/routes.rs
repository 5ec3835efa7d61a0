use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::guard;
use crate::posts;
use crate::threads;

/// Build the full route table. Exported separately from the binary so the
/// integration tests can drive the router in-process.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(threads::index))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/thread/{id}", get(threads::show_thread))
        .with_state(state.clone());

    let protected = Router::new()
        .route(
            "/thread/new",
            get(threads::new_thread_form).post(threads::create_thread),
        )
        .route("/thread/{id}/post", post(posts::create_post))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_session,
        ))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}
