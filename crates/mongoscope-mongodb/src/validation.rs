//! Input validation for database and collection names
//!
//! Names arrive as untrusted path parameters. By default the gateway passes
//! them to the driver verbatim; when name validation is switched on they go
//! through these types first.
//!
//! # Rules
//! - Database names: MongoDB's own naming restrictions
//! - Collection names: no system collections, no `$`, no null bytes

use crate::Result;
use mongoscope_common::MongoscopeError;

/// Maximum database name length accepted by MongoDB
const MAX_DATABASE_NAME_LENGTH: usize = 63;

/// Maximum allowed length for collection names (MongoDB limit is 255, we're more conservative)
const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// Characters MongoDB forbids in database names
const FORBIDDEN_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?', '\0'];

/// Validated database name
///
/// # Guarantees
/// - Not empty
/// - At most 63 bytes
/// - None of `/\. "$*<>:|?` or null bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDatabaseName {
    name: String,
}

impl ValidatedDatabaseName {
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(MongoscopeError::Validation(
                "Database name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_DATABASE_NAME_LENGTH {
            return Err(MongoscopeError::Validation(format!(
                "Database name exceeds maximum length of {} bytes: '{}'",
                MAX_DATABASE_NAME_LENGTH, name
            )));
        }

        if let Some(c) = name.chars().find(|c| FORBIDDEN_DATABASE_CHARS.contains(c)) {
            return Err(MongoscopeError::Validation(format!(
                "Database name contains forbidden character {:?}: '{}'",
                c,
                name.replace('\0', "\\0")
            )));
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl AsRef<str> for ValidatedDatabaseName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedDatabaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validated collection name
///
/// # Guarantees
/// - Not empty
/// - Maximum 120 characters
/// - No null bytes
/// - No "system." prefix (system collections)
/// - No $ characters (special operators)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCollectionName {
    name: String,
}

impl ValidatedCollectionName {
    /// Creates a new validated collection name
    ///
    /// # Errors
    /// Returns a validation error if the name is empty, too long, contains a
    /// null byte or `$`, or starts with `system.`.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(MongoscopeError::Validation(
                "Collection name cannot be empty".to_string(),
            ));
        }

        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(MongoscopeError::Validation(format!(
                "Collection name exceeds maximum length of {} characters: '{}'",
                MAX_COLLECTION_NAME_LENGTH, name
            )));
        }

        if name.contains('\0') {
            return Err(MongoscopeError::Validation(
                "Collection name cannot contain null bytes".to_string(),
            ));
        }

        // Reserved for system collections
        if name.starts_with("system.") {
            return Err(MongoscopeError::Validation(format!(
                "Collection name cannot start with 'system.' (reserved): '{}'",
                name
            )));
        }

        if name.contains('$') {
            return Err(MongoscopeError::Validation(format!(
                "Collection name cannot contain '$' character: '{}'",
                name
            )));
        }

        if name.contains("..") || name.contains("//") {
            tracing::warn!("Collection name contains suspicious pattern: '{}'", name);
        }

        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Returns the validated collection name as a string slice
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl AsRef<str> for ValidatedCollectionName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_database_names() {
        for name in ["metrics", "load_tests", "team-42", "A"] {
            assert!(ValidatedDatabaseName::new(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_database_name_forbidden_characters() {
        for name in ["a.b", "a/b", "a b", "$db", "a\0b", "what?"] {
            let err = ValidatedDatabaseName::new(name).unwrap_err();
            assert!(matches!(err, MongoscopeError::Validation(_)), "{name}");
        }
    }

    #[test]
    fn test_database_name_length() {
        assert!(ValidatedDatabaseName::new("").is_err());
        assert!(ValidatedDatabaseName::new(&"d".repeat(63)).is_ok());
        assert!(ValidatedDatabaseName::new(&"d".repeat(64)).is_err());
    }

    #[test]
    fn test_valid_collection_names() {
        for name in ["results", "results.2024", "batch_runs", "a-b"] {
            let validated = ValidatedCollectionName::new(name).unwrap();
            assert_eq!(validated.as_str(), name);
        }
    }

    #[test]
    fn test_empty_collection_name() {
        assert!(ValidatedCollectionName::new("").is_err());
    }

    #[test]
    fn test_collection_name_too_long() {
        assert!(ValidatedCollectionName::new(&"c".repeat(121)).is_err());
    }

    #[test]
    fn test_collection_name_with_null_byte() {
        assert!(ValidatedCollectionName::new("res\0ults").is_err());
    }

    #[test]
    fn test_system_collection_blocked() {
        let err = ValidatedCollectionName::new("system.users").unwrap_err();
        assert!(err.to_string().contains("system."));
    }

    #[test]
    fn test_collection_name_with_dollar_sign() {
        assert!(ValidatedCollectionName::new("res$ults").is_err());
    }

    #[test]
    fn test_validated_names_display() {
        let db = ValidatedDatabaseName::new("metrics").unwrap();
        let coll = ValidatedCollectionName::new("results").unwrap();
        assert_eq!(format!("{}.{}", db, coll), "metrics.results");
    }
}
