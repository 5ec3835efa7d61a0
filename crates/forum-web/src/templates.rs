//! Askama page templates and the view structs they render.
//!
//! Row types from forum-db stay as TEXT; ids pass through untouched and
//! timestamps are reformatted for display here, with a warning (never a
//! failure) on a value that does not parse.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Utc};
use tracing::{error, warn};

use forum_db::models::{PostRow, ThreadRow};

#[derive(Debug, Clone)]
pub struct ThreadView {
    pub id: String,
    pub title: String,
    pub author: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PostView {
    pub author: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub user: Option<String>,
    pub threads: Vec<ThreadView>,
}

#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadPage {
    pub user: Option<String>,
    pub thread: ThreadView,
    pub posts: Vec<PostView>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "new_thread.html")]
pub struct NewThreadPage {
    pub user: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
}

pub fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("template render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn thread_view(row: ThreadRow) -> ThreadView {
    let created_at = format_timestamp(&row.created_at, &row.id);
    ThreadView {
        id: row.id,
        title: row.title,
        author: row.author_username,
        created_at,
    }
}

pub fn post_view(row: PostRow) -> PostView {
    let created_at = format_timestamp(&row.created_at, &row.id);
    PostView {
        author: row.author_username,
        content: row.content,
        created_at,
    }
}

fn format_timestamp(raw: &str, id: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string(),
        Err(e) => {
            warn!("Corrupt created_at '{}' on '{}': {}", raw, id, e);
            raw.to_string()
        }
    }
}
