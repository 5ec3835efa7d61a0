use crate::Database;
use crate::error::StoreError;
use crate::models::{PostRow, ThreadRow, UserRow};
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

/// RFC 3339 with a fixed six-digit fraction, so lexicographic order on the
/// stored TEXT column is chronological order.
fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, username, password_hash, now_utc()),
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::DuplicateUsername
                }
                other => other.into(),
            })?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Threads --

    pub fn create_thread(&self, id: &str, title: &str, author_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO threads (id, title, author_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, title, author_id, now_utc()),
            )?;
            Ok(())
        })
    }

    pub fn list_threads(&self) -> Result<Vec<ThreadRow>, StoreError> {
        self.with_conn(query_threads)
    }

    pub fn get_thread(&self, id: &str) -> Result<Option<ThreadRow>, StoreError> {
        self.with_conn(|conn| query_thread(conn, id))
    }

    // -- Posts --

    /// Fails with `UnknownThread` before writing anything if the parent
    /// thread does not exist. Check and insert run under the same lock.
    pub fn create_post(
        &self,
        id: &str,
        thread_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let exists: Option<i64> = conn
                .query_row("SELECT 1 FROM threads WHERE id = ?1", [thread_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::UnknownThread);
            }

            conn.execute(
                "INSERT INTO posts (id, thread_id, author_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, thread_id, author_id, content, now_utc()),
            )?;
            Ok(())
        })
    }

    pub fn list_posts(&self, thread_id: &str) -> Result<Vec<PostRow>, StoreError> {
        self.with_conn(|conn| query_posts(conn, thread_id))
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_threads(conn: &Connection) -> Result<Vec<ThreadRow>, StoreError> {
    // JOIN users to fetch the author's display name in a single query.
    // rowid breaks ties between inserts that land in the same microsecond.
    let mut stmt = conn.prepare(
        "SELECT t.id, t.title, t.author_id, u.username, t.created_at
         FROM threads t
         JOIN users u ON t.author_id = u.id
         ORDER BY t.created_at DESC, t.rowid DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ThreadRow {
                id: row.get(0)?,
                title: row.get(1)?,
                author_id: row.get(2)?,
                author_username: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_thread(conn: &Connection, id: &str) -> Result<Option<ThreadRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.title, t.author_id, u.username, t.created_at
         FROM threads t
         JOIN users u ON t.author_id = u.id
         WHERE t.id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(ThreadRow {
                id: row.get(0)?,
                title: row.get(1)?,
                author_id: row.get(2)?,
                author_username: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_posts(conn: &Connection, thread_id: &str) -> Result<Vec<PostRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.thread_id, p.author_id, u.username, p.content, p.created_at
         FROM posts p
         JOIN users u ON p.author_id = u.id
         WHERE p.thread_id = ?1
         ORDER BY p.created_at ASC, p.rowid ASC",
    )?;

    let rows = stmt
        .query_map([thread_id], |row| {
            Ok(PostRow {
                id: row.get(0)?,
                thread_id: row.get(1)?,
                author_id: row.get(2)?,
                author_username: row.get(3)?,
                content: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, username, "hash").unwrap();
        id
    }

    fn add_thread(db: &Database, title: &str, author_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_thread(&id, title, author_id).unwrap();
        id
    }

    #[test]
    fn duplicate_username_rejected_first_record_intact() {
        let db = db();
        let first = add_user(&db, "alice");

        let err = db
            .create_user(&Uuid::new_v4().to_string(), "alice", "other-hash")
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));

        let row = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(row.id, first);
        assert_eq!(row.password, "hash");
    }

    #[test]
    fn threads_listed_newest_first() {
        let db = db();
        let author = add_user(&db, "alice");
        let t1 = add_thread(&db, "first", &author);
        let t2 = add_thread(&db, "second", &author);
        let t3 = add_thread(&db, "third", &author);

        let ids: Vec<String> = db.list_threads().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![t3, t2, t1]);
    }

    #[test]
    fn thread_rows_carry_author_username() {
        let db = db();
        let author = add_user(&db, "alice");
        let tid = add_thread(&db, "hello", &author);

        let thread = db.get_thread(&tid).unwrap().unwrap();
        assert_eq!(thread.title, "hello");
        assert_eq!(thread.author_username, "alice");
    }

    #[test]
    fn posts_listed_oldest_first() {
        let db = db();
        let author = add_user(&db, "bob");
        let tid = add_thread(&db, "topic", &author);

        for content in ["one", "two", "three"] {
            db.create_post(&Uuid::new_v4().to_string(), &tid, &author, content)
                .unwrap();
        }

        let contents: Vec<String> =
            db.list_posts(&tid).unwrap().into_iter().map(|p| p.content).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn post_on_unknown_thread_writes_nothing() {
        let db = db();
        let author = add_user(&db, "bob");

        let err = db
            .create_post(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &author,
                "hi",
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownThread));

        let count = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get::<_, i64>(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn concurrent_posts_both_land() {
        let db = Arc::new(db());
        let author = add_user(&db, "carol");
        let tid = add_thread(&db, "topic", &author);

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let db = db.clone();
                let author = author.clone();
                let tid = tid.clone();
                std::thread::spawn(move || {
                    db.create_post(
                        &Uuid::new_v4().to_string(),
                        &tid,
                        &author,
                        &format!("post {i}"),
                    )
                    .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let posts = db.list_posts(&tid).unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts[0].created_at <= posts[1].created_at);
    }
}
