/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `user`: Registration, token issuance and the caller's own profile
/// - `recipe`: Recipe CRUD scoped to the caller
/// - `tag`: Tag listing and renaming scoped to the caller

pub mod health;
pub mod recipe;
pub mod tag;
pub mod user;

/// Strips surrounding whitespace from a text field before it is validated
pub(crate) fn trim_field(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_field() {
        let mut value = "  Pancakes \n".to_string();
        trim_field(&mut value);
        assert_eq!(value, "Pancakes");

        let mut blank = "   ".to_string();
        trim_field(&mut blank);
        assert!(blank.is_empty());
    }
}
