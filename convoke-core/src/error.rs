//! Error types for the convoke invite pipeline.

use thiserror::Error;

/// Errors that can occur while building, repairing, or sending an invite.
#[derive(Error, Debug)]
pub enum InviteError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    #[error("Unknown timezone: '{0}' is not an IANA timezone identifier")]
    UnknownTimezone(String),

    #[error("Unsupported timezone: no transition rules available for '{0}'")]
    UnsupportedTimezone(String),

    #[error("Calendar payload is not 7-bit ASCII (byte 0x{byte:02X} at offset {offset})")]
    NonAsciiPayload { byte: u8, offset: usize },

    #[error("Mailer error: {0}")]
    Mailer(String),

    #[error("Mailer '{0}' not found in PATH")]
    MailerNotInstalled(String),

    #[error("Mailer request timed out after {0}s")]
    MailerTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for convoke operations.
pub type InviteResult<T> = Result<T, InviteError>;
