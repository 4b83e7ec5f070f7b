pub mod severity;
pub mod record;
pub mod date_pattern;
pub mod formatter;
pub mod transport;
pub mod report;
pub mod error;
pub mod sink;
pub mod telegram;
pub mod layer;

pub mod init;
pub mod env;

pub use error::{DeliveryError, HandlerError};
pub use telegram::{DeliveryResponse, TelegramConfig, TelegramHandler};
