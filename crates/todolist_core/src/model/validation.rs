//! Name validation for items and categories.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejection reasons for record input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Name has no characters at all.
    EmptyName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Rejects empty names. Whitespace counts as content and is kept as typed.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}
