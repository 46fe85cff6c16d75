/// Request authentication context
///
/// Resolves the `Authorization` header of a request to the user who owns the
/// token. Handlers receive the resulting [`AuthContext`] through request
/// extensions and scope every query by [`AuthContext::user_id`].
///
/// # Example
///
/// ```no_run
/// use recipebox_shared::auth::context::authenticate;
/// use recipebox_shared::store::memory::MemoryStore;
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// let result = authenticate(&store, Some("Token 0123456789abcdef0123456789abcdef01234567")).await;
/// assert!(result.is_err());
/// # }
/// ```

use serde::Serialize;

use super::token::{parse_authorization_header, validate_token_format, HeaderError};
use crate::models::user::User;
use crate::store::{Store, StoreError};

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    /// The user who owns the presented token
    pub user: User,
}

impl AuthContext {
    /// Creates a context for an authenticated user
    pub fn from_user(user: User) -> Self {
        Self { user }
    }

    /// ID of the authenticated user
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

/// Error type for token authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable credentials in the request
    #[error("{0}")]
    MissingCredentials(HeaderError),

    /// Token unknown or malformed
    #[error("Invalid token")]
    InvalidToken,

    /// Token belongs to a deactivated account
    #[error("User inactive or deleted")]
    InactiveUser,

    /// Token lookup failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Authenticates a request from its `Authorization` header value
///
/// # Errors
///
/// - `MissingCredentials` when the header is absent or unparseable
/// - `InvalidToken` when no stored token matches
/// - `InactiveUser` when the owning account is deactivated
pub async fn authenticate(
    store: &dyn Store,
    header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials(HeaderError::Missing))?;
    let token = parse_authorization_header(header).map_err(AuthError::MissingCredentials)?;

    if !validate_token_format(token) {
        return Err(AuthError::InvalidToken);
    }

    let user = store
        .find_user_by_token(token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    if !user.is_active {
        tracing::warn!(user_id = user.id, "Token presented for inactive user");
        return Err(AuthError::InactiveUser);
    }

    Ok(AuthContext::from_user(user))
}
