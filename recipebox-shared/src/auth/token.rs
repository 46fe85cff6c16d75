/// Opaque authentication tokens
///
/// Tokens are 20 random bytes rendered as 40 lowercase hex characters.
/// Only the SHA-256 digest of a token is stored; the plaintext is handed to
/// the client once, when it is issued.
///
/// Clients send the token as `Authorization: Token <key>`. The `Bearer`
/// scheme is accepted as well.
///
/// # Example
///
/// ```
/// use recipebox_shared::auth::token::{generate_token, hash_token, validate_token_format};
///
/// let (token, digest) = generate_token();
/// assert!(validate_token_format(&token));
/// assert_eq!(hash_token(&token), digest);
/// ```

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in a token
const TOKEN_BYTES: usize = 20;

/// Length of a token in hex characters
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Number of leading characters kept in clear for identification
pub const TOKEN_PREFIX_LENGTH: usize = 8;

/// Authorization schemes accepted in the `Authorization` header
const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// Generates a new token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hex_digest)
pub fn generate_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let digest = hash_token(&token);

    (token, digest)
}

/// Hashes a token with SHA-256, hex-encoded (64 characters)
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns the clear prefix stored next to the digest
pub fn token_prefix(token: &str) -> String {
    token.chars().take(TOKEN_PREFIX_LENGTH).collect()
}

/// Checks that a token is exactly 40 lowercase hex characters
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Constant-time string comparison
///
/// Accumulates the XOR of every byte pair so the running time does not
/// depend on where the inputs first differ.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Error returned when an `Authorization` header cannot yield a token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// Header absent or using an unknown scheme
    #[error("Authentication credentials were not provided")]
    Missing,

    /// Scheme present but no key after it
    #[error("Invalid token header. No credentials provided")]
    Empty,

    /// Key contains spaces
    #[error("Invalid token header. Token string should not contain spaces")]
    Spaces,
}

/// Extracts the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively.
///
/// # Example
///
/// ```
/// use recipebox_shared::auth::token::{parse_authorization_header, HeaderError};
///
/// assert_eq!(parse_authorization_header("Token abc"), Ok("abc"));
/// assert_eq!(parse_authorization_header("Bearer abc"), Ok("abc"));
/// assert_eq!(parse_authorization_header("Basic abc"), Err(HeaderError::Missing));
/// ```
pub fn parse_authorization_header(value: &str) -> Result<&str, HeaderError> {
    let value = value.trim();
    let (scheme, rest) = match value.split_once(' ') {
        Some((scheme, rest)) => (scheme, rest.trim()),
        None => (value, ""),
    };

    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Err(HeaderError::Missing);
    }

    if rest.is_empty() {
        return Err(HeaderError::Empty);
    }

    if rest.contains(char::is_whitespace) {
        return Err(HeaderError::Spaces);
    }

    Ok(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let (token1, hash1) = generate_token();
        let (token2, hash2) = generate_token();

        assert_eq!(token1.len(), TOKEN_LENGTH);
        assert!(validate_token_format(&token1));

        assert_ne!(token1, token2);
        assert_ne!(hash1, hash2);

        assert_eq!(hash1.len(), 64);
        assert_eq!(hash_token(&token1), hash1);
    }

    #[test]
    fn test_hash_token_is_deterministic() {
        let hash = hash_token("abc");
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_validate_token_format() {
        assert!(validate_token_format(&"a".repeat(40)));
        assert!(validate_token_format("0123456789abcdef0123456789abcdef01234567"));

        assert!(!validate_token_format("short"));
        assert!(!validate_token_format(&"a".repeat(41)));
        assert!(!validate_token_format(&"A".repeat(40)));
        assert!(!validate_token_format(&"g".repeat(40)));
    }

    #[test]
    fn test_token_prefix() {
        assert_eq!(token_prefix("0123456789abcdef"), "01234567");
        assert_eq!(token_prefix("abc"), "abc");
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));

        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello2"));
        assert!(!constant_time_compare("", "not empty"));
    }

    #[test]
    fn test_parse_authorization_header() {
        assert_eq!(parse_authorization_header("Token abc123"), Ok("abc123"));
        assert_eq!(parse_authorization_header("token abc123"), Ok("abc123"));
        assert_eq!(parse_authorization_header("Bearer abc123"), Ok("abc123"));
        assert_eq!(parse_authorization_header("  Token   abc123 "), Ok("abc123"));

        assert_eq!(parse_authorization_header(""), Err(HeaderError::Missing));
        assert_eq!(parse_authorization_header("Basic dXNlcjpwYXNz"), Err(HeaderError::Missing));
        assert_eq!(parse_authorization_header("abc123"), Err(HeaderError::Missing));
        assert_eq!(parse_authorization_header("Token"), Err(HeaderError::Empty));
        assert_eq!(parse_authorization_header("Token abc 123"), Err(HeaderError::Spaces));
    }
}
