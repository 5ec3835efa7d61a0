use crate::error::StoreError;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS threads (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            author_id   TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_threads_created
            ON threads(created_at);

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            thread_id   TEXT NOT NULL REFERENCES threads(id),
            author_id   TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_thread
            ON posts(thread_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
