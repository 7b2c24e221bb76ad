use crate::config::UsageConfig;
use rocket::local::asynchronous::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub(crate) const TEST_API_KEY: &str = "sk-ant-test";

pub(crate) struct TestClientBuilder {
    config: UsageConfig,
}

impl TestClientBuilder {
    pub(crate) fn new() -> Self {
        // Port 1 is never listening locally, so an unconfigured test cannot
        // reach the real API.
        Self {
            config: UsageConfig::default().with_api_key(TEST_API_KEY).with_endpoints(
                "http://127.0.0.1:1/v1/usage",
                "http://127.0.0.1:1/v1/admin/usage",
            ),
        }
    }

    pub(crate) fn endpoints(mut self, primary: &str, fallback: &str) -> Self {
        self.config = self.config.with_endpoints(primary, fallback);
        self
    }

    pub(crate) fn without_api_key(mut self) -> Self {
        self.config = self.config.without_api_key();
        self
    }

    pub(crate) async fn build(self) -> Client {
        Client::tracked(crate::rocket(self.config))
            .await
            .expect("valid client")
    }
}

// Shared across every mock so accept order can be compared between servers.
static ACCEPT_SEQ: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone)]
enum Reply {
    Respond(String),
    Hangup,
}

/// A one-response-per-connection HTTP server standing in for the usage API.
pub(crate) struct MockUpstream {
    pub(crate) url: String,
    accepts: Arc<Mutex<Vec<usize>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub(crate) async fn json(status_line: &str, body: &str) -> Self {
        Self::start(Reply::Respond(http_response(status_line, "application/json", body))).await
    }

    pub(crate) async fn text(status_line: &str, body: &str) -> Self {
        Self::start(Reply::Respond(http_response(status_line, "text/plain", body))).await
    }

    /// Accepts the connection, reads the request and closes without answering,
    /// which the client sees as a transport fault.
    pub(crate) async fn hangup() -> Self {
        Self::start(Reply::Hangup).await
    }

    async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream address");

        let accepts = Arc::new(Mutex::new(Vec::new()));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (server_accepts, server_requests) = (accepts.clone(), requests.clone());

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                server_accepts
                    .lock()
                    .expect("accepts lock")
                    .push(ACCEPT_SEQ.fetch_add(1, Ordering::SeqCst));

                let reply = reply.clone();
                let requests = server_requests.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    requests
                        .lock()
                        .expect("requests lock")
                        .push(String::from_utf8_lossy(&buf[..n]).into_owned());
                    if let Reply::Respond(response) = reply {
                        let _ = socket.write_all(response.as_bytes()).await;
                    }
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            url: format!("http://{addr}/v1/usage"),
            accepts,
            requests,
        }
    }

    pub(crate) fn hits(&self) -> usize {
        self.accepts.lock().expect("accepts lock").len()
    }

    /// Position of this server's first accepted connection among all mocks.
    pub(crate) fn first_accept(&self) -> Option<usize> {
        self.accepts.lock().expect("accepts lock").first().copied()
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }
}

fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nConnection: close\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

/// A URL on a port nothing listens on, so connecting fails at the transport level.
pub(crate) async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway address");
    drop(listener);
    format!("http://{addr}/v1/usage")
}
