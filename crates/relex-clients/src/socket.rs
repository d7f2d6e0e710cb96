//! Line-protocol socket transport
//!
//! All collaborator services accept a newline-terminated UTF-8 request and
//! reply until they close the connection. [`LineClient`] adds the trailing
//! newline, enforces a per-call connect/read timeout, and retries a bounded
//! number of times before giving up.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_RETRIES: u32 = 2;

/// A request/response client for one collaborator endpoint.
#[derive(Debug, Clone)]
pub struct LineClient {
    host: String,
    port: u16,
    timeout: Duration,
    retries: u32,
}

impl LineClient {
    /// Create a client with default timeout and retry settings.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }

    /// Set the per-call connect/read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the bounded retry count.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Endpoint description for error messages.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Send `text` and collect the full response, trimmed.
    ///
    /// The request gets a trailing newline if missing (the Java-based
    /// services read line-delimited input). Each failed attempt is logged and
    /// retried until the retry budget is spent; the last error is returned.
    pub async fn request(&self, text: &str) -> io::Result<String> {
        let mut payload = text.to_string();
        if !payload.ends_with('\n') {
            payload.push('\n');
        }

        let mut last_err = None;
        for attempt in 0..=self.retries {
            match self.try_request(&payload).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    debug!(
                        endpoint = %self.endpoint(),
                        attempt,
                        error = %e,
                        "request attempt failed"
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| io::Error::other("no request attempt made")))
    }

    async fn try_request(&self, payload: &str) -> io::Result<String> {
        let mut stream = self
            .bounded(TcpStream::connect((self.host.as_str(), self.port)))
            .await??;

        stream.write_all(payload.as_bytes()).await?;
        // Half-close so the server sees end of request and replies fully.
        stream.shutdown().await?;

        let mut response = String::new();
        self.bounded(stream.read_to_string(&mut response)).await??;

        Ok(response.trim().to_string())
    }

    async fn bounded<F, T>(&self, fut: F) -> io::Result<T>
    where
        F: std::future::Future<Output = T>,
    {
        timeout(self.timeout, fut).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("call to {} timed out", self.endpoint()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    async fn echo_server() -> (String, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                tokio::spawn(async move {
                    let mut buf = String::new();
                    let _ = stream.read_to_string(&mut buf).await;
                    let _ = stream.write_all(buf.to_uppercase().as_bytes()).await;
                });
            }
        });
        ("127.0.0.1".to_string(), port)
    }

    #[tokio::test]
    async fn test_request_appends_newline_and_trims_response() {
        let (host, port) = echo_server().await;
        let client = LineClient::new(host, port);

        let response = client.request("aspirin").await.unwrap();
        assert_eq!(response, "ASPIRIN");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_after_retries() {
        // port 1 is never bound in the test environment
        let client = LineClient::new("127.0.0.1", 1)
            .with_timeout(Duration::from_millis(200))
            .with_retries(1);

        assert!(client.request("x").await.is_err());
    }
}
