use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand_core::{OsRng, RngCore};
use uuid::Uuid;

use forum_types::models::SessionUser;

struct SessionEntry {
    user: SessionUser,
    issued_at: Instant,
}

/// Server-side session table: opaque token -> authenticated identity.
///
/// Tokens are 32 random bytes, hex-encoded; the browser only ever sees the
/// token, never the identity. Held as an explicit instance in shared state
/// and guarded by a lock, since concurrent requests resolve and end
/// sessions simultaneously. Expired entries are dropped on lookup.
pub struct SessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn start(&self, user_id: Uuid, username: &str) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let mut entries = self.lock();
        // Abandoned sessions never get resolved again, so sweep them here
        // to keep the table from growing without bound.
        entries.retain(|_, entry| entry.issued_at.elapsed() < self.ttl);
        entries.insert(
            token.clone(),
            SessionEntry {
                user: SessionUser {
                    id: user_id,
                    username: username.to_string(),
                },
                issued_at: Instant::now(),
            },
        );
        token
    }

    pub fn resolve(&self, token: &str) -> Option<SessionUser> {
        let mut entries = self.lock();
        let expired = entries
            .get(token)
            .is_some_and(|entry| entry.issued_at.elapsed() >= self.ttl);
        if expired {
            entries.remove(token);
            return None;
        }
        entries.get(token).map(|entry| entry.user.clone())
    }

    /// Idempotent: ending an unknown or already-ended token is a no-op.
    pub fn end(&self, token: &str) {
        self.lock().remove(token);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        // A panic while holding the lock leaves no broken invariant in a
        // plain map, so recover the guard rather than poisoning every
        // later request.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(60 * 60))
    }

    #[test]
    fn start_resolve_round_trip() {
        let sessions = store();
        let user_id = Uuid::new_v4();

        let token = sessions.start(user_id, "alice");
        assert_eq!(token.len(), 64); // 32 bytes, hex

        let user = sessions.resolve(&token).unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn tokens_are_unique_per_session() {
        let sessions = store();
        let user_id = Uuid::new_v4();
        let a = sessions.start(user_id, "alice");
        let b = sessions.start(user_id, "alice");
        assert_ne!(a, b);
    }

    #[test]
    fn end_is_idempotent_and_resolve_returns_absent() {
        let sessions = store();
        let token = sessions.start(Uuid::new_v4(), "alice");

        sessions.end(&token);
        assert!(sessions.resolve(&token).is_none());

        // Second end on the same token is a no-op.
        sessions.end(&token);
        assert!(sessions.resolve(&token).is_none());
    }

    #[test]
    fn expired_sessions_resolve_to_absent() {
        let sessions = SessionStore::new(Duration::ZERO);
        let token = sessions.start(Uuid::new_v4(), "alice");
        assert!(sessions.resolve(&token).is_none());
    }

    #[test]
    fn starting_a_session_sweeps_expired_entries() {
        let sessions = SessionStore::new(Duration::ZERO);
        sessions.start(Uuid::new_v4(), "alice");
        sessions.start(Uuid::new_v4(), "bob");

        // Both earlier tokens expired instantly; only the newest insert
        // survives each sweep.
        let token = sessions.start(Uuid::new_v4(), "carol");
        let entries = sessions.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key(&token));
    }

    #[test]
    fn unknown_token_resolves_to_absent() {
        let sessions = store();
        assert!(sessions.resolve("deadbeef").is_none());
    }
}
