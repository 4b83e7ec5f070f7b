use crate::record::LogRecord;
use async_trait::async_trait;
use std::error::Error;

/// Destination for [`LogRecord`]s produced by the Telegram layer.
///
/// [`crate::telegram::TelegramHandler`] is the main implementation; the
/// trait exists so the layer can be exercised against other sinks.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Hand a single record to the sink.
    ///
    /// **Parameters**
    /// - `record`: fully-populated [`LogRecord`] produced by the layer.
    ///
    /// **Returns**
    /// - `Ok(())` once the sink has dealt with the record. For the
    ///   Telegram handler this includes failed deliveries, which it
    ///   reports on its own side channel.
    /// - `Err(..)` for problems the sink cannot absorb, such as a level
    ///   missing from the glyph table. The layer prints these to stderr;
    ///   it never retries.
    async fn write(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;
}
