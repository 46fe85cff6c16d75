/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: Opaque token generation, hashing and header parsing
/// - [`context`]: Per-request authentication context and token lookup
///
/// # Example
///
/// ```
/// use recipebox_shared::auth::password::{hash_password, verify_password};
/// use recipebox_shared::auth::token::generate_token;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let (token, digest) = generate_token();
/// assert_eq!(token.len(), 40);
/// assert_eq!(digest.len(), 64);
/// # Ok(())
/// # }
/// ```

pub mod context;
pub mod password;
pub mod token;
