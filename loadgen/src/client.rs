use std::time::{Instant, SystemTime};

use anyhow::{Context, Result};
use bytes::Bytes;
use game_load_util::drain::{DrainBodyFuture, DEFAULT_BODY_LIMIT};
use game_load_util::{byte_body, empty_body};
use http_body_util::Full;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;

use crate::error::TaskError;
use crate::telemetry::{EventSink, RequestEvent};

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    /// Fails with [`TaskError::Status`] unless the status is 2xx.
    pub fn success(self, path: &str) -> Result<Self, TaskError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(TaskError::Status {
                path: path.to_string(),
                status: self.status,
            })
        }
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, TaskError> {
        serde_json::from_slice(&self.body).map_err(|source| TaskError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

/// HTTP client bound to one target host. Every request is reported to the sink,
/// failed ones included.
#[derive(Clone)]
pub struct HttpClient<K> {
    client: Client<HttpConnector, Full<Bytes>>,
    base_uri: String,
    sink: K,
}

impl<K: EventSink> HttpClient<K> {
    #[must_use]
    pub fn new(base_uri: &str, sink: K) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            base_uri: base_uri.trim_end_matches('/').to_string(),
            sink,
        }
    }

    #[inline]
    pub async fn get(&self, path: &str) -> Result<HttpResponse, TaskError> {
        self.request(Method::GET, path, path, None).await
    }

    /// Like [`Self::get`], reported under `name` instead of the concrete path.
    #[inline]
    pub async fn get_named(&self, path: &str, name: &str) -> Result<HttpResponse, TaskError> {
        self.request(Method::GET, path, name, None).await
    }

    #[inline]
    pub async fn post(&self, path: &str) -> Result<HttpResponse, TaskError> {
        self.request(Method::POST, path, path, None).await
    }

    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<HttpResponse, TaskError> {
        let body = encode(&Method::POST, path, body)?;
        self.request(Method::POST, path, path, Some(body)).await
    }

    pub async fn put_json<T: Serialize>(&self, path: &str, body: &T) -> Result<HttpResponse, TaskError> {
        let body = encode(&Method::PUT, path, body)?;
        self.request(Method::PUT, path, path, Some(body)).await
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        name: &str,
        body: Option<Vec<u8>>,
    ) -> Result<HttpResponse, TaskError> {
        let transport = |source: anyhow::Error| TaskError::Transport {
            method: method.to_string(),
            path: path.to_string(),
            source,
        };
        let mut event = RequestEvent::new(method.as_str(), name, SystemTime::now());
        let start = Instant::now();
        let request = match Request::builder()
            .method(method.clone())
            .uri(format!("{}{path}", self.base_uri))
            .header(CONTENT_TYPE, "application/json")
            .body(body.map_or_else(empty_body, byte_body))
            .context("Failed to build request")
        {
            Ok(request) => request,
            Err(e) => {
                event.response_time = start.elapsed();
                event.exception = Some(anyhow::anyhow!("{e:#}"));
                self.sink.fire(event);
                return Err(transport(e));
            }
        };
        let res = self.send_recv(request).await;
        event.response_time = start.elapsed();
        match res {
            Ok((status, body)) => {
                let body = Bytes::from(body);
                if status.is_success() {
                    event.response_length = body.len() as u64;
                } else {
                    event.exception = Some(anyhow::anyhow!("{method} {path} returned {status}"));
                }
                event.response = Some(body.clone());
                self.sink.fire(event);
                Ok(HttpResponse { status, body })
            }
            Err(e) => {
                event.exception = Some(anyhow::anyhow!("{e:#}"));
                self.sink.fire(event);
                Err(transport(e))
            }
        }
    }

    async fn send_recv(&self, request: Request<Full<Bytes>>) -> Result<(StatusCode, Vec<u8>)> {
        let resp = self
            .client
            .request(request)
            .await
            .context("Failed to send request")?;
        let status = resp.status();
        let content_length: usize = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|hv| hv.parse().ok())
            .unwrap_or(1024);
        let bytes: Vec<u8> =
            DrainBodyFuture::with_limit(resp.into_body(), content_length, DEFAULT_BODY_LIMIT)
                .await
                .context("Failed to read response body")?;
        Ok((status, bytes))
    }
}

fn encode<T: Serialize>(method: &Method, path: &str, body: &T) -> Result<Vec<u8>, TaskError> {
    serde_json::to_vec(body).map_err(|e| TaskError::Transport {
        method: method.to_string(),
        path: path.to_string(),
        source: anyhow::Error::new(e).context("Failed to encode request body"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::RecordingSink;
    use std::sync::Arc;

    #[tokio::test]
    async fn unbuildable_request_is_still_reported() {
        let sink = Arc::new(RecordingSink::default());
        let client = HttpClient::new("http://127.0.0.1:1", sink.clone());
        let err = client
            .get_named("/players/not a uri", "/players/[id]")
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Transport { .. }), "{err:?}");
        let events = sink.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].request_type, "GET");
        assert_eq!(events[0].name, "/players/[id]");
        assert_eq!(events[0].response_length, 0);
        assert!(!events[0].is_success());
    }

    #[test]
    fn null_body_decodes_as_no_ids() {
        let res = HttpResponse {
            status: StatusCode::OK,
            body: Bytes::from_static(b"null"),
        };
        assert!(res.json::<Vec<String>>("/players").is_err());
        let ids: Option<Vec<String>> = res.json("/players").unwrap();
        assert!(ids.is_none());
    }
}
