#![cfg(feature = "http")]

use mockito::{Matcher, Server};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_telegram_sink::error::{DeliveryError, HandlerError};
use tracing_telegram_sink::layer::TelegramLayer;
use tracing_telegram_sink::record::LogRecord;
use tracing_telegram_sink::report::ErrorReporter;
use tracing_telegram_sink::severity::Severity;
use tracing_telegram_sink::telegram::{TelegramConfig, TelegramHandler};
use tracing_telegram_sink::transport::TransportConfig;

const TOKEN: &str = "123456:TEST-token";

fn config(server: &Server) -> TelegramConfig {
    let mut config = TelegramConfig::new(TOKEN, "@ops");
    config.api_base = server.url();
    config.date_format = "Y-m-d".to_string();
    config
}

fn recording_reporter() -> (Arc<dyn ErrorReporter>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let reporter = move |e: &DeliveryError| sink.lock().unwrap().push(e.to_string());
    (Arc::new(reporter), seen)
}

#[tokio::test]
async fn posts_form_to_send_message_endpoint() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", format!("/bot{}/SendMessage", TOKEN).as_str())
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("chat_id".into(), "@ops".into()),
            Matcher::UrlEncoded("text".into(), "hello & welcome".into()),
            Matcher::UrlEncoded("parse_mode".into(), "HTML".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"result":{"message_id":42}}"#)
        .create_async()
        .await;

    let (reporter, seen) = recording_reporter();
    let handler = TelegramHandler::from_config(config(&server)).unwrap().with_reporter(reporter);

    handler.send("hello & welcome", &[("parse_mode", "HTML")]).await;

    mock.assert_async().await;
    assert!(handler.response().unwrap().ok);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn api_rejection_is_reported_not_returned() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .with_status(400)
        .with_body(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#)
        .create_async()
        .await;

    let (reporter, seen) = recording_reporter();
    let handler = TelegramHandler::from_config(config(&server)).unwrap().with_reporter(reporter);

    handler.write(&LogRecord::new(Severity::Error, "disk full")).await.unwrap();

    mock.assert_async().await;
    let response = handler.response().unwrap();
    assert!(!response.ok);
    assert_eq!(response.error_code, Some(400));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("chat not found"));
}

#[tokio::test]
async fn non_json_reply_is_a_transport_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let (reporter, seen) = recording_reporter();
    let handler = TelegramHandler::from_config(config(&server)).unwrap().with_reporter(reporter);

    let err = handler.deliver("hello", &[]).await.unwrap_err();
    assert!(matches!(err, DeliveryError::Transport(_)));
    assert!(handler.response().is_none());

    handler.send("hello", &[]).await;
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_is_absorbed_and_hides_the_token() {
    let mut config = TelegramConfig::new(TOKEN, "@ops");
    // Nothing listens on port 9 on loopback.
    config.api_base = "http://127.0.0.1:9".to_string();
    config.transport.timeout = Duration::from_secs(2);

    let (reporter, seen) = recording_reporter();
    let handler = TelegramHandler::from_config(config).unwrap().with_reporter(reporter);

    handler.send("hello", &[]).await;

    assert!(handler.response().is_none());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("telegram transport failure"));
    assert!(!seen[0].contains(TOKEN));
}

#[test]
fn invalid_proxy_fails_construction() {
    let mut config = TelegramConfig::new(TOKEN, "@ops");
    config.transport = TransportConfig {
        proxy: Some("http://[bad".to_string()),
        ..TransportConfig::default()
    };

    match TelegramHandler::from_config(config) {
        Err(HandlerError::TransportUnavailable(e)) => assert!(e.to_string().starts_with("transport unavailable")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("handler built with an invalid proxy"),
    }
}

#[tokio::test]
async fn layer_delivers_tracing_errors_end_to_end() {
    let mut server = Server::new_async().await;
    let expected_text = format!(
        "{}\n\u{1F6A8} {}.ERROR: payment failed{{\"order\":17}}",
        chrono::Utc::now().format("%Y-%m-%d"),
        module_path!()
    );
    let mock = server
        .mock("POST", format!("/bot{}/SendMessage", TOKEN).as_str())
        .match_body(Matcher::UrlEncoded("text".into(), expected_text))
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let handler = Arc::new(TelegramHandler::from_config(config(&server)).unwrap());
    let layer = TelegramLayer::new(handler.clone(), Level::ERROR);
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));

    tracing::error!(order = 17, "payment failed");

    for _ in 0..50 {
        if mock.matched_async().await {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    mock.assert_async().await;
    assert!(handler.response().unwrap().ok);
}
