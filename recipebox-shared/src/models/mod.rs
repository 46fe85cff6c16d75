/// Database models for Recipebox
///
/// Each model carries its PostgreSQL operations as associated functions
/// taking a pool or connection. Recipe and tag operations always take the
/// owning user's ID.
///
/// # Models
///
/// - `user`: User accounts
/// - `auth_token`: Opaque authentication tokens
/// - `tag`: Per-user tags
/// - `recipe`: Per-user recipes and their tag assignments

pub mod auth_token;
pub mod recipe;
pub mod tag;
pub mod user;
