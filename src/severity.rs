use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Severity levels understood by the Telegram handler.
///
/// Mirrors the eight syslog-style levels used by most PHP and Python
/// logging stacks. `tracing` only knows five of them; the remaining ones
/// are reachable through the `severity` event field (see
/// [`crate::layer::TelegramLayer`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    pub const ALL: [Severity; 8] = [
        Severity::Debug,
        Severity::Info,
        Severity::Notice,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Alert,
        Severity::Emergency,
    ];

    /// Numeric level code as used by Monolog (100 for DEBUG up to 600 for
    /// EMERGENCY).
    pub fn code(self) -> u16 {
        match self {
            Severity::Debug => 100,
            Severity::Info => 200,
            Severity::Notice => 250,
            Severity::Warning => 300,
            Severity::Error => 400,
            Severity::Critical => 500,
            Severity::Alert => 550,
            Severity::Emergency => 600,
        }
    }

    /// Resolve a numeric level code back into a [`Severity`].
    ///
    /// **Returns**
    /// - `Err(UnknownSeverity)` for any code outside the eight defined levels.
    pub fn from_code(code: u16) -> Result<Self, UnknownSeverity> {
        Severity::ALL
            .into_iter()
            .find(|level| level.code() == code)
            .ok_or_else(|| UnknownSeverity::new(code.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "notice" => Ok(Severity::Notice),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            "alert" => Ok(Severity::Alert),
            "emergency" => Ok(Severity::Emergency),
            _ => Err(UnknownSeverity::new(s)),
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

/// Raised when a level cannot be resolved or has no glyph.
///
/// A missing glyph means the glyph table and the level enumeration have
/// drifted apart, so this is treated as a configuration bug rather than
/// silently defaulted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity level: {level}")]
pub struct UnknownSeverity {
    pub level: String,
}

impl UnknownSeverity {
    pub fn new(level: impl Into<String>) -> Self {
        UnknownSeverity { level: level.into() }
    }
}

/// Immutable severity-to-glyph table.
///
/// [`GlyphMap::default`] covers every [`Severity`]. Custom tables built
/// with [`GlyphMap::new`] may be partial; looking up a level they do not
/// cover yields [`UnknownSeverity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMap {
    glyphs: BTreeMap<Severity, String>,
}

impl GlyphMap {
    pub fn new<I, G>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Severity, G)>,
        G: Into<String>,
    {
        GlyphMap {
            glyphs: entries.into_iter().map(|(level, glyph)| (level, glyph.into())).collect(),
        }
    }

    pub fn glyph(&self, level: Severity) -> Result<&str, UnknownSeverity> {
        self.glyphs
            .get(&level)
            .map(String::as_str)
            .ok_or_else(|| UnknownSeverity::new(level.name()))
    }
}

impl Default for GlyphMap {
    fn default() -> Self {
        GlyphMap::new([
            (Severity::Debug, "\u{1F6A7}"),
            (Severity::Info, "\u{200D}\u{1F5E8}"),
            (Severity::Notice, "\u{1F575}"),
            (Severity::Warning, "\u{26A1}\u{FE0F}"),
            (Severity::Error, "\u{1F6A8}"),
            (Severity::Critical, "\u{1F912}"),
            (Severity::Alert, "\u{1F440}"),
            (Severity::Emergency, "\u{1F915}"),
        ])
    }
}
