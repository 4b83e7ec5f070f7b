use async_trait::async_trait;
use std::time::Duration;

/// Outbound HTTP capability used by [`crate::telegram::TelegramHandler`].
///
/// The handler only ever needs one call shape: POST a form and read the
/// body back as text. Keeping it behind a trait lets tests swap in a stub
/// without a network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `fields` form-encoded to `url` and return the response body.
    ///
    /// **Returns**
    /// - `Ok(body)` whenever a response arrived, whatever its status code.
    /// - `Err(TransportError)` on connection errors, timeouts or an
    ///   unreadable body. The error text must not contain `url`, since it
    ///   carries the bot token.
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String, TransportError>;
}

/// Failure while talking to the remote endpoint.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The HTTP transport could not be set up.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("transport unavailable: {0}")]
pub struct TransportUnavailable(pub String);

/// Settings for [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Upper bound for a whole request, connect included.
    pub timeout: Duration,
    /// Verify the server certificate. When `false`, any certificate is
    /// accepted.
    pub verify_tls: bool,
    /// Optional HTTPS proxy URL.
    pub proxy: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            verify_tls: true,
            proxy: None,
        }
    }
}

#[cfg(feature = "http")]
pub use client::HttpTransport;

#[cfg(feature = "http")]
mod client {
    use super::{Transport, TransportConfig, TransportError, TransportUnavailable};
    use async_trait::async_trait;
    use reqwest::Client;

    /// [`Transport`] backed by a `reqwest` client.
    #[derive(Clone)]
    pub struct HttpTransport {
        client: Client,
    }

    impl HttpTransport {
        /// Build the underlying client.
        ///
        /// **Returns**
        /// - `Err(TransportUnavailable)` if the proxy URL is invalid or the
        ///   TLS backend cannot be initialised.
        pub fn new(config: &TransportConfig) -> Result<Self, TransportUnavailable> {
            let mut builder = Client::builder()
                .timeout(config.timeout)
                .danger_accept_invalid_certs(!config.verify_tls);

            if let Some(proxy) = &config.proxy {
                let proxy = reqwest::Proxy::https(proxy.as_str())
                    .map_err(|e| TransportUnavailable(format!("invalid proxy: {}", e.without_url())))?;
                builder = builder.proxy(proxy);
            }

            let client = builder
                .build()
                .map_err(|e| TransportUnavailable(e.without_url().to_string()))?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String, TransportError> {
            let resp = self
                .client
                .post(url)
                .form(fields)
                .send()
                .await
                .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

            resp.text()
                .await
                .map_err(|e| TransportError::Request(e.without_url().to_string()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn builds_with_defaults() {
            assert!(HttpTransport::new(&TransportConfig::default()).is_ok());
        }

        #[test]
        fn invalid_proxy_makes_transport_unavailable() {
            let config = TransportConfig {
                proxy: Some("http://[bad".to_string()),
                ..TransportConfig::default()
            };
            let err = HttpTransport::new(&config).err().unwrap();
            assert!(err.0.contains("invalid proxy"), "{err}");
        }
    }
}
