/// Database row types — these map directly to SQLite rows.
/// Distinct from the forum-types models to keep the DB layer independent;
/// ids and timestamps stay as TEXT here and are parsed at the web layer.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ThreadRow {
    pub id: String,
    pub title: String,
    pub author_id: String,
    pub author_username: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub thread_id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub created_at: String,
}
