/// Input validation for ingestion routes
use thiserror::Error;

/// Max records accepted in one snapshot (prevents DOS)
pub const MAX_SNAPSHOT_RECORDS: usize = 2048;

/// Max length of a server scope name
pub const MAX_SERVER_LEN: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Server name cannot be empty")]
    ServerNameEmpty,

    #[error("Server name too long (max 64 characters, got {0})")]
    ServerNameTooLong(usize),

    #[error("Server name contains invalid characters (only alphanumeric, '-' and '_' allowed)")]
    ServerNameInvalidChars,

    #[error("Snapshot too large (max {max} records, got {actual})")]
    SnapshotTooLarge { max: usize, actual: usize },
}

/// Validates a server scope taken from the URL
///
/// Rules:
/// - Cannot be empty
/// - Max 64 characters
/// - Only ASCII alphanumeric characters, '-' and '_'
pub fn validate_server_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::ServerNameEmpty);
    }

    if name.len() > MAX_SERVER_LEN {
        return Err(ValidationError::ServerNameTooLong(name.len()));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::ServerNameInvalidChars);
    }

    Ok(())
}

/// Validates the size of an incoming snapshot
pub fn validate_snapshot(records: &[serde_json::Value]) -> Result<(), ValidationError> {
    if records.len() > MAX_SNAPSHOT_RECORDS {
        return Err(ValidationError::SnapshotTooLarge {
            max: MAX_SNAPSHOT_RECORDS,
            actual: records.len(),
        });
    }

    Ok(())
}
