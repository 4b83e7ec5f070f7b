use crate::severity::UnknownSeverity;
use crate::transport::{TransportError, TransportUnavailable};

/// Errors that reach the caller of the handler.
///
/// Only construction problems and glyph-table gaps propagate; delivery
/// problems are reported through [`crate::report::ErrorReporter`] instead
/// (see [`DeliveryError`]).
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    TransportUnavailable(#[from] TransportUnavailable),

    #[error(transparent)]
    UnknownSeverity(#[from] UnknownSeverity),
}

/// A single message could not be delivered.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// The Bot API answered with `ok: false`.
    #[error("telegram api response: {description}")]
    Rejected {
        description: String,
        error_code: Option<i64>,
    },

    #[error("telegram transport failure: {0}")]
    Transport(#[from] TransportError),
}
