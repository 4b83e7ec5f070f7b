use crate::layer::TelegramLayer;
use crate::sink::LogSink;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging layer.
///
/// **Fields**
/// - `min_level`: least severe `tracing` level forwarded to the sink.
///   Defaults to `ERROR`; every forwarded event costs one HTTP request.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`TelegramLayer`] and all events are also printed
///   to the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            enable_stdout: true,
        }
    }
}

/// Initialize the global `tracing` subscriber using the provided sink and
/// [`LayerConfig`].
///
/// **Parameters**
/// - `sink`: implementation of [`LogSink`] that will receive
///   [`crate::record::LogRecord`]s, normally a
///   [`crate::telegram::TelegramHandler`].
/// - `config`: [`LayerConfig`] controlling level filtering and console
///   output.
///
/// **Returns**
/// - `Err(SetGlobalDefaultError)` if a global subscriber is already set.
pub fn init_tracing_with_config(sink: Arc<dyn LogSink>, config: LayerConfig) -> Result<(), SetGlobalDefaultError> {
    let layer = TelegramLayer::new(sink, config.min_level);

    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Initialize tracing with [`LayerConfig::default`]: `ERROR` events go to
/// `sink`, everything is printed to the console.
pub fn init_tracing(sink: Arc<dyn LogSink>) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(sink, LayerConfig::default())
}
