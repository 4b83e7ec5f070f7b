use crate::error::DeliveryError;

/// Side channel for delivery failures.
///
/// [`crate::telegram::TelegramHandler::send`] never returns delivery errors
/// to its caller; it hands them here instead.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &DeliveryError);
}

/// Writes delivery failures to stderr.
///
/// Must not emit `tracing` events: they would re-enter the Telegram layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrReporter;

impl ErrorReporter for StderrReporter {
    fn report(&self, error: &DeliveryError) {
        eprintln!("telegram log sink: {}", error);
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&DeliveryError) + Send + Sync,
{
    fn report(&self, error: &DeliveryError) {
        self(error)
    }
}
