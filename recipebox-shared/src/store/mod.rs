/// Owner-scoped persistence
///
/// [`Store`] is the seam between the HTTP handlers and storage. Every recipe
/// and tag operation takes the owner's user ID as a required argument, so a
/// caller can only ever see or touch its own records.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx, used by the server
/// - [`memory::MemoryStore`]: in-process tables, used by tests and demos
///
/// # Example
///
/// ```
/// use recipebox_shared::store::{memory::MemoryStore, Store};
/// use recipebox_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = store.create_user(CreateUser {
///     email: "cook@example.com".to_string(),
///     name: "Cook".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// assert!(store.list_recipes(user.id).await?.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    auth_token::AuthToken,
    recipe::{CreateRecipe, Recipe, UpdateRecipe},
    tag::{Tag, UpdateTag},
    user::{CreateUser, UpdateUser, User},
};

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated
    #[error("{field}: {message}")]
    Conflict {
        /// Request field the conflict is reported against
        field: &'static str,
        message: String,
    },

    /// The backing database failed
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.constraint() {
                Some("users_email_key") => return StoreError::email_taken(),
                Some("tags_user_id_name_key") => return StoreError::tag_name_taken(),
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

impl StoreError {
    pub(crate) fn email_taken() -> Self {
        StoreError::Conflict {
            field: "email",
            message: "User with this email already exists".to_string(),
        }
    }

    pub(crate) fn tag_name_taken() -> Self {
        StoreError::Conflict {
            field: "name",
            message: "Tag with this name already exists".to_string(),
        }
    }
}

/// Persistence operations used by the API
#[async_trait]
pub trait Store: Send + Sync {
    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn update_user(&self, id: i64, data: UpdateUser) -> StoreResult<Option<User>>;

    // Tokens

    /// Issues a token, returning the stored record and the plaintext
    async fn create_token(&self, user_id: i64) -> StoreResult<(AuthToken, String)>;

    /// Resolves a plaintext token to its owner
    async fn find_user_by_token(&self, token: &str) -> StoreResult<Option<User>>;

    // Recipes, scoped by owner

    /// Owner's recipes, newest first
    async fn list_recipes(&self, owner: i64) -> StoreResult<Vec<Recipe>>;

    async fn find_recipe(&self, owner: i64, id: i64) -> StoreResult<Option<Recipe>>;

    async fn create_recipe(&self, data: CreateRecipe) -> StoreResult<Recipe>;

    async fn update_recipe(
        &self,
        owner: i64,
        id: i64,
        data: UpdateRecipe,
    ) -> StoreResult<Option<Recipe>>;

    async fn delete_recipe(&self, owner: i64, id: i64) -> StoreResult<bool>;

    // Tags, scoped by owner

    /// Owner's tags, alphabetical by name
    async fn list_tags(&self, owner: i64) -> StoreResult<Vec<Tag>>;

    async fn update_tag(&self, owner: i64, id: i64, data: UpdateTag) -> StoreResult<Option<Tag>>;
}
