use crate::date_pattern;
use crate::record::LogRecord;
use crate::severity::{GlyphMap, UnknownSeverity};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maximum length, in bytes, of the message body before context is
/// appended. Matches the Telegram `sendMessage` text limit.
pub const MESSAGE_LIMIT: usize = 4096;

/// Source of the wall-clock time stamped on every message.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Turns a [`LogRecord`] into the text posted to the chat.
///
/// The output layout is
/// `<date>\n<glyph> <truncated formatted line><serialized context>`.
/// The date is taken from the clock at format time, not from the
/// record's own timestamp.
#[derive(Clone)]
pub struct RecordFormatter {
    glyphs: GlyphMap,
    clock: Arc<dyn Clock>,
}

impl RecordFormatter {
    pub fn new(glyphs: GlyphMap, clock: Arc<dyn Clock>) -> Self {
        RecordFormatter { glyphs, clock }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_glyphs(mut self, glyphs: GlyphMap) -> Self {
        self.glyphs = glyphs;
        self
    }

    /// Render one record.
    ///
    /// **Parameters**
    /// - `record`: the event to render; its `formatted` line is the body.
    /// - `date_format`: PHP-style date pattern, see [`crate::date_pattern`].
    /// - `timezone`: IANA name or fixed offset the date is shown in.
    ///
    /// **Returns**
    /// - `Err(UnknownSeverity)` when the glyph table has no entry for the
    ///   record's level. Nothing else fails: a bad date pattern produces
    ///   odd text and unserializable context is dropped.
    pub fn format(
        &self,
        record: &LogRecord,
        date_format: &str,
        timezone: &str,
    ) -> Result<String, UnknownSeverity> {
        let glyph = self.glyphs.glyph(record.level)?;
        let date = date_pattern::render_in(date_format, self.clock.now(), timezone);
        let context = stringify_context(&record.context);
        let body = truncate_message(&record.formatted, MESSAGE_LIMIT);

        let mut message =
            String::with_capacity(date.len() + glyph.len() + body.len() + context.len() + 2);
        message.push_str(&date);
        message.push('\n');
        message.push_str(glyph);
        message.push(' ');
        message.push_str(body);
        message.push_str(&context);
        Ok(message)
    }
}

impl Default for RecordFormatter {
    fn default() -> Self {
        RecordFormatter::new(GlyphMap::default(), Arc::new(SystemClock))
    }
}

/// Take at most `limit` bytes from the front of `message`.
///
/// If the cut would split a multi-byte character, the whole character is
/// left out, so the result may be a few bytes shorter than `limit`.
pub fn truncate_message(message: &str, limit: usize) -> &str {
    if message.len() <= limit {
        return message;
    }
    let mut end = limit;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

/// Compact JSON rendering of the context, or an empty string when there
/// is no context or it cannot be serialized.
pub fn stringify_context(context: &BTreeMap<String, serde_json::Value>) -> String {
    if context.is_empty() {
        return String::new();
    }
    serde_json::to_string(context).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;

    fn new_year_formatter() -> RecordFormatter {
        let at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        RecordFormatter::default().with_clock(Arc::new(FixedClock(at)))
    }

    #[test]
    fn golden_output_without_context() {
        let record = LogRecord::new(Severity::Error, "disk full");
        let out = new_year_formatter().format(&record, "Y-m-d", "UTC").unwrap();
        assert_eq!(out, "2024-01-01\n🚨 disk full");
    }

    #[test]
    fn context_is_appended_with_sorted_keys() {
        let record = LogRecord::new(Severity::Warning, "slow query")
            .with_context("ms", 1200)
            .with_context("db", "orders");
        let out = new_year_formatter().format(&record, "Y-m-d", "UTC").unwrap();
        assert_eq!(out, "2024-01-01\n\u{26A1}\u{FE0F} slow query{\"db\":\"orders\",\"ms\":1200}");
    }

    #[test]
    fn body_is_the_formatted_line_not_the_message() {
        let record = LogRecord::new(Severity::Info, "raw").with_formatted("app.INFO: raw");
        let out = new_year_formatter().format(&record, "Y", "UTC").unwrap();
        assert!(out.ends_with(" app.INFO: raw"));
    }

    #[test]
    fn short_body_is_untouched() {
        let body = "x".repeat(MESSAGE_LIMIT);
        assert_eq!(truncate_message(&body, MESSAGE_LIMIT), body);
    }

    #[test]
    fn long_body_is_cut_before_context_is_appended() {
        let body = "a".repeat(MESSAGE_LIMIT + 10);
        let record = LogRecord::new(Severity::Debug, body).with_context("k", "v");
        let out = new_year_formatter().format(&record, "Y-m-d", "UTC").unwrap();

        let prefix = "2024-01-01\n\u{1F6A7} ";
        let rest = out.strip_prefix(prefix).unwrap();
        assert_eq!(rest, format!("{}{{\"k\":\"v\"}}", "a".repeat(MESSAGE_LIMIT)));
        assert!(rest.len() > MESSAGE_LIMIT);
    }

    #[test]
    fn truncation_never_splits_a_character() {
        // 'é' is two bytes; a limit of 3 would land inside the second one.
        assert_eq!(truncate_message("éé", 3), "é");
        assert_eq!(truncate_message("éé", 4), "éé");
    }

    #[test]
    fn missing_glyph_is_an_error() {
        let formatter = new_year_formatter().with_glyphs(GlyphMap::new([(Severity::Error, "E")]));
        let record = LogRecord::new(Severity::Alert, "oops");
        let err = formatter.format(&record, "Y-m-d", "UTC").unwrap_err();
        assert_eq!(err, UnknownSeverity::new("ALERT"));
    }

    #[test]
    fn empty_context_serializes_to_nothing() {
        assert_eq!(stringify_context(&BTreeMap::new()), "");
    }
}
