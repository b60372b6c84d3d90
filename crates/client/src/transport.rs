//! Thin transports behind the fetch layer.
//!
//! [`JsonRpc`] and [`GraphQl`] are the only seams the client needs; tests
//! script them, production wires [`HttpTransport`] and [`GraphQlTransport`].

use async_trait::async_trait;
use http::HeaderMap;
use jsonrpsee::{
    core::{client::ClientT, params::ArrayParams, params::BatchRequestBuilder},
    http_client::{HttpClient, HttpClientBuilder},
};
use serde_json::Value;
use std::time::Duration;

/// Timeout applied to every JSON-RPC request. Block traces are slow.
const RPC_HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout applied to GraphQL balance queries.
const GRAPHQL_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Path of the node's GraphQL endpoint, relative to the RPC base URL.
const GRAPHQL_PATH: &str = "graphql";

/// Transport-level failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The node failed or rejected a single call.
    #[error("rpc call `{method}` failed: {message}")]
    Rpc {
        /// Method that failed.
        method: String,
        /// Node-reported failure.
        message: String,
    },
    /// HTTP-level failure before any call completed.
    #[error("http request failed: {0}")]
    Http(String),
    /// The request was canceled while waiting for capacity.
    #[error("request canceled")]
    Canceled,
}

impl TransportError {
    fn rpc(method: impl Into<String>, message: impl ToString) -> Self {
        TransportError::Rpc { method: method.into(), message: message.to_string() }
    }
}

/// One element of a batched JSON-RPC request.
#[derive(Debug, Clone)]
pub struct BatchCall {
    /// Method name.
    pub method: &'static str,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl BatchCall {
    /// A batch element for `method` with `params`.
    pub fn new(method: &'static str, params: Vec<Value>) -> Self {
        Self { method, params }
    }
}

/// The JSON-RPC capability the fetch layer needs.
#[async_trait]
pub trait JsonRpc: Send + Sync {
    /// Issues a single call, returning the raw result.
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError>;

    /// Issues every call in one round trip.
    ///
    /// Results come back in request order. The first failing element fails
    /// the whole batch; elements are never silently skipped.
    async fn batch(&self, calls: &[BatchCall]) -> Result<Vec<Value>, TransportError>;
}

/// The GraphQL capability the balance path needs.
#[async_trait]
pub trait GraphQl: Send + Sync {
    /// Posts `query` and returns the raw response body.
    async fn query(&self, query: &str) -> Result<String, TransportError>;
}

/// JSON-RPC over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    /// Connects to the node at `url`.
    pub fn new(url: &str) -> Result<Self, TransportError> {
        Self::with_headers(url, HeaderMap::new())
    }

    /// Connects to the node at `url`, attaching `headers` to every request.
    pub fn with_headers(url: &str, headers: HeaderMap) -> Result<Self, TransportError> {
        let client = HttpClientBuilder::default()
            .request_timeout(RPC_HTTP_TIMEOUT)
            .set_headers(headers)
            .build(url)
            .map_err(|err| TransportError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

fn array_params(method: &str, params: &[Value]) -> Result<ArrayParams, TransportError> {
    let mut array = ArrayParams::new();
    for param in params {
        array.insert(param).map_err(|err| TransportError::rpc(method, err))?;
    }
    Ok(array)
}

#[async_trait]
impl JsonRpc for HttpTransport {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let params = array_params(method, &params)?;
        self.client.request(method, params).await.map_err(|err| TransportError::rpc(method, err))
    }

    async fn batch(&self, calls: &[BatchCall]) -> Result<Vec<Value>, TransportError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let mut batch = BatchRequestBuilder::new();
        for call in calls {
            let params = array_params(call.method, &call.params)?;
            batch.insert(call.method, params).map_err(|err| TransportError::rpc(call.method, err))?;
        }
        let responses = self
            .client
            .batch_request::<Value>(batch)
            .await
            .map_err(|err| TransportError::Http(err.to_string()))?;

        let mut results = Vec::with_capacity(calls.len());
        for (call, response) in calls.iter().zip(responses.into_iter()) {
            match response {
                Ok(value) => results.push(value),
                Err(err) => {
                    return Err(TransportError::rpc(
                        call.method,
                        format!("code {}: {}", err.code(), err.message()),
                    ))
                }
            }
        }
        Ok(results)
    }
}

/// GraphQL over HTTP, posting to `<base>/graphql`.
#[derive(Debug, Clone)]
pub struct GraphQlTransport {
    client: reqwest::Client,
    url: String,
}

impl GraphQlTransport {
    /// Connects to the GraphQL endpoint next to the RPC base at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let url = format!("{}/{GRAPHQL_PATH}", base_url.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(GRAPHQL_HTTP_TIMEOUT)
            .build()
            .map_err(|err| TransportError::Http(err.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl GraphQl for GraphQlTransport {
    async fn query(&self, query: &str) -> Result<String, TransportError> {
        let body = serde_json::json!({ "query": query });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|err| TransportError::Http(err.to_string()))?;
        response.text().await.map_err(|err| TransportError::Http(err.to_string()))
    }
}
