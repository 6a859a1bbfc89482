//! Provider implementations, one per request shape

mod anthropic;
mod gemini;
mod mock;
mod openai;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use mock::{MockProvider, MOCK_PAYLOAD};
pub use openai::{OpenAiConfig, OpenAiProvider};

/// In-process stand-in for an upstream model API
#[cfg(test)]
pub(crate) mod fake_upstream {
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::Json;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// One request as seen by the fake upstream
    #[derive(Debug, Clone)]
    pub struct Captured {
        pub path: String,
        pub query: Option<String>,
        pub headers: HeaderMap,
        pub body: Value,
    }

    /// Handle to a running fake upstream
    pub struct Upstream {
        pub base_url: String,
        captured: Arc<Mutex<Vec<Captured>>>,
    }

    impl Upstream {
        pub fn requests(&self) -> Vec<Captured> {
            self.captured
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }
    }

    /// Serve `body` with `status` for every request
    pub async fn spawn(status: u16, body: Value) -> Upstream {
        spawn_delayed(status, body, Duration::ZERO).await
    }

    /// Like [`spawn`], but wait `delay` before answering
    pub async fn spawn_delayed(status: u16, body: Value, delay: Duration) -> Upstream {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let status = StatusCode::from_u16(status).unwrap();

        let app = axum::Router::new().fallback(
            move |uri: Uri, headers: HeaderMap, raw: Bytes| {
                let sink = sink.clone();
                let body = body.clone();
                async move {
                    sink.lock().unwrap().push(Captured {
                        path: uri.path().to_string(),
                        query: uri.query().map(str::to_string),
                        headers,
                        body: serde_json::from_slice(&raw).unwrap_or(Value::Null),
                    });
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    (status, Json(body))
                }
            },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Upstream {
            base_url: format!("http://{addr}"),
            captured,
        }
    }

    /// An address nothing listens on
    pub async fn closed_port() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }
}
