use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity attached to a request once its session cookie resolves.
/// Stored in request extensions by the access guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}
