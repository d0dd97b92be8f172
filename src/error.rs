use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{action}: {field} is required")]
    Validation {
        action: &'static str,
        field: &'static str,
    },

    #[error("{action} failed: {cause}")]
    External { action: &'static str, cause: String },

    #[error("{action} failed: rate limit reached, try again shortly")]
    RateLimited { action: &'static str },

    #[error("{action} failed: usage quota exhausted")]
    QuotaExhausted { action: &'static str },

    #[error("{action} cancelled")]
    Cancelled { action: &'static str },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("export to {format} failed: {cause}")]
    Export { format: &'static str, cause: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

pub fn require<'a>(action: &'static str, field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReportError::Validation { action, field });
    }
    Ok(trimmed)
}
