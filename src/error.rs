//! Error types for the quotation wizard

use thiserror::Error;

/// Result type alias for wizard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, exporting or sending a quotation
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing or holds an invalid value
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// An uploaded logo or signature was rejected
    #[error("{0}")]
    Upload(#[from] UploadError),

    /// A step transition is not allowed right now
    #[error("Navigation refused: {0}")]
    Navigation(String),

    /// Failed to lay out or rasterize the document view
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Failed to encode or save an export artifact
    #[error("Export failed: {0}")]
    Export(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Missing-field conditions. The `Display` text is what the user is shown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter customer name")]
    MissingCustomerName,

    #[error("Please add at least one item")]
    NoItems,

    #[error("Please fill in all required fields with valid values")]
    InvalidItem,

    #[error("Please enter an email address")]
    MissingEmail,

    #[error("Please enter a WhatsApp number")]
    MissingPhoneNumber,
}

impl ValidationError {
    /// Short title used for the notice raised alongside the error
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::MissingCustomerName | ValidationError::NoItems => "Missing information",
            ValidationError::InvalidItem => "Invalid item",
            ValidationError::MissingEmail => "Missing email",
            ValidationError::MissingPhoneNumber => "Missing phone number",
        }
    }
}

/// Reasons an image upload is discarded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("File size should be less than {limit_mb}MB")]
    TooLarge { size: usize, limit_mb: usize },

    #[error("Only image files are allowed")]
    NotAnImage { mime_type: String },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        let err: Error = ValidationError::MissingCustomerName.into();
        assert_eq!(err.to_string(), "Please enter customer name");
        assert_eq!(ValidationError::NoItems.title(), "Missing information");
    }

    #[test]
    fn upload_too_large_mentions_limit() {
        let err = UploadError::TooLarge { size: 6 * 1024 * 1024, limit_mb: 5 };
        assert_eq!(err.to_string(), "File size should be less than 5MB");
    }
}
