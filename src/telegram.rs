use crate::date_pattern::{DEFAULT_DATE_FORMAT, DEFAULT_TIMEZONE};
use crate::error::{DeliveryError, HandlerError};
use crate::formatter::RecordFormatter;
use crate::record::LogRecord;
use crate::report::{ErrorReporter, StderrReporter};
use crate::severity::UnknownSeverity;
use crate::sink::LogSink;
use crate::transport::{Transport, TransportConfig, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const RESERVED_FIELDS: [&str; 2] = ["text", "chat_id"];

/// Configuration for [`TelegramHandler`].
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather. Never logged.
    pub token: String,
    /// Chat id or `@channelusername` messages are posted to.
    pub channel: String,
    /// Timezone the date line is rendered in.
    pub timezone: String,
    /// PHP-style date pattern for the first line of every message.
    pub date_format: String,
    /// Bot API base URL, without the `/bot<token>` part.
    pub api_base: String,
    /// Extra `sendMessage` fields sent with every message, e.g.
    /// `parse_mode` or `message_thread_id`.
    pub default_fields: BTreeMap<String, String>,
    pub transport: TransportConfig,
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Self {
        TelegramConfig {
            token: token.into(),
            channel: channel.into(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            default_fields: BTreeMap::new(),
            transport: TransportConfig::default(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("channel", &self.channel)
            .field("timezone", &self.timezone)
            .field("date_format", &self.date_format)
            .field("api_base", &self.api_base)
            .field("default_fields", &self.default_fields)
            .field("transport", &self.transport)
            .finish()
    }
}

/// Decoded body of a `sendMessage` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResponse {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
struct FormatSettings {
    timezone: String,
    date_format: String,
}

/// Posts log records to a Telegram chat through the Bot API.
///
/// Each [`TelegramHandler::write`] formats the record and issues exactly
/// one `sendMessage` request. There is no queue and no retry. Delivery
/// failures never reach the caller; they go to the configured
/// [`ErrorReporter`] (stderr by default).
///
/// The handler is `Sync`: the last response and the date settings sit
/// behind locks, so one instance can be shared by every thread that logs.
pub struct TelegramHandler {
    token: String,
    channel: String,
    api_base: String,
    default_fields: BTreeMap<String, String>,
    settings: RwLock<FormatSettings>,
    formatter: RecordFormatter,
    transport: Arc<dyn Transport>,
    reporter: Arc<dyn ErrorReporter>,
    response: Mutex<Option<DeliveryResponse>>,
}

impl TelegramHandler {
    /// Create a handler with the default timezone (`UTC`), date format and
    /// HTTP transport.
    ///
    /// **Returns**
    /// - `Err(HandlerError::TransportUnavailable)` if the HTTP client
    ///   cannot be built or the `http` feature is disabled.
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Result<Self, HandlerError> {
        Self::from_config(TelegramConfig::new(token, channel))
    }

    /// Create a handler from a full [`TelegramConfig`], building the
    /// `reqwest` transport eagerly.
    pub fn from_config(config: TelegramConfig) -> Result<Self, HandlerError> {
        #[cfg(feature = "http")]
        {
            let transport = crate::transport::HttpTransport::new(&config.transport)?;
            Ok(Self::with_transport(config, Arc::new(transport)))
        }

        #[cfg(not(feature = "http"))]
        {
            let _ = config;
            Err(crate::transport::TransportUnavailable("http feature is not enabled".to_string()).into())
        }
    }

    /// Create a handler on top of an already built [`Transport`].
    ///
    /// `config.transport` is ignored here; it only drives the default
    /// HTTP transport.
    pub fn with_transport(config: TelegramConfig, transport: Arc<dyn Transport>) -> Self {
        TelegramHandler {
            token: config.token,
            channel: config.channel,
            api_base: config.api_base,
            default_fields: config.default_fields,
            settings: RwLock::new(FormatSettings {
                timezone: config.timezone,
                date_format: config.date_format,
            }),
            formatter: RecordFormatter::default(),
            transport,
            reporter: Arc::new(StderrReporter),
            response: Mutex::new(None),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_formatter(mut self, formatter: RecordFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn set_timezone(&self, timezone: impl Into<String>) {
        self.settings_mut().timezone = timezone.into();
    }

    pub fn timezone(&self) -> String {
        self.settings().timezone.clone()
    }

    /// Replace the date pattern. It is not validated; an odd pattern shows
    /// up as odd text in the next message.
    pub fn set_date_format(&self, date_format: impl Into<String>) {
        self.settings_mut().date_format = date_format.into();
    }

    pub fn date_format(&self) -> String {
        self.settings().date_format.clone()
    }

    /// Reply to the most recent send, or `None` if nothing was sent yet or
    /// the last attempt failed before a reply could be decoded.
    pub fn response(&self) -> Option<DeliveryResponse> {
        self.response.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Render a record with the current date settings.
    pub fn format(&self, record: &LogRecord) -> Result<String, UnknownSeverity> {
        let settings = self.settings();
        self.formatter.format(record, &settings.date_format, &settings.timezone)
    }

    /// Format `record` and send it.
    ///
    /// **Returns**
    /// - `Err(UnknownSeverity)` if the glyph table has no entry for the
    ///   record's level; nothing is sent in that case.
    /// - `Ok(())` otherwise, whether or not delivery succeeded.
    pub async fn write(&self, record: &LogRecord) -> Result<(), UnknownSeverity> {
        let message = self.format(record)?;
        self.send(&message, &[]).await;
        Ok(())
    }

    /// Send a text message, reporting any failure instead of returning it.
    ///
    /// `extra_fields` are added to the form after the configured default
    /// fields and override them. Keys `text` and `chat_id` are ignored.
    pub async fn send(&self, message: &str, extra_fields: &[(&str, &str)]) {
        match self.deliver(message, extra_fields).await {
            Ok(_) => tracing::debug!(channel = %self.channel, "telegram message delivered"),
            Err(e) => self.reporter.report(&e),
        }
    }

    /// Send a text message and return the outcome.
    ///
    /// The decoded reply is stored for [`TelegramHandler::response`] before
    /// it is inspected, so a rejected message is still observable there.
    pub async fn deliver(
        &self,
        message: &str,
        extra_fields: &[(&str, &str)],
    ) -> Result<DeliveryResponse, DeliveryError> {
        let fields = self.form_fields(message, extra_fields);
        let outcome = self.exchange(&fields).await;

        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = outcome.as_ref().ok().cloned();

        let response = outcome?;
        if !response.ok {
            return Err(DeliveryError::Rejected {
                description: response.description.clone().unwrap_or_default(),
                error_code: response.error_code,
            });
        }
        Ok(response)
    }

    async fn exchange(&self, fields: &[(String, String)]) -> Result<DeliveryResponse, TransportError> {
        let body = self.transport.post_form(&self.endpoint(), fields).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/SendMessage", self.api_base.trim_end_matches('/'), self.token)
    }

    fn form_fields(&self, message: &str, extra_fields: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut extras = self.default_fields.clone();
        for (key, value) in extra_fields {
            extras.insert((*key).to_string(), (*value).to_string());
        }

        let mut fields = vec![
            ("text".to_string(), message.to_string()),
            ("chat_id".to_string(), self.channel.clone()),
        ];
        fields.extend(
            extras
                .into_iter()
                .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str())),
        );
        fields
    }

    fn settings(&self) -> std::sync::RwLockReadGuard<'_, FormatSettings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn settings_mut(&self) -> std::sync::RwLockWriteGuard<'_, FormatSettings> {
        self.settings.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LogSink for TelegramHandler {
    async fn write(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        TelegramHandler::write(self, record).await?;
        Ok(())
    }
}
