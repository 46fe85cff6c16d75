//! # Recipebox Shared Library
//!
//! Types, persistence and authentication primitives used by the Recipebox
//! API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their PostgreSQL operations
//! - `store`: Owner-scoped persistence trait with PostgreSQL and in-memory backends
//! - `auth`: Password hashing, opaque tokens and the request authentication context
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Recipebox shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
