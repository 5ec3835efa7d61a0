pub mod auth;
pub mod guard;
pub mod posts;
pub mod routes;
pub mod session;
pub mod templates;
pub mod threads;
