//! HTTP transport.
//!
//! The shipped [`Transport`] implementation: joins descriptor paths onto a
//! base URL, attaches a bearer token when a provider is configured, and maps
//! response failures into [`TransportError`]. The cache core never sees any
//! of this.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;

use crate::transport::{Method, RequestDescriptor, Transport, TransportError};

type TokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

#[derive(Debug, Error)]
pub enum HttpTransportError {
    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

pub struct HttpTransport {
    client: Client,
    base: Url,
    token_provider: Option<TokenProvider>,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, HttpTransportError> {
        let base = Url::parse(base_url)?.join("/")?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| HttpTransportError::Client(err.to_string()))?;
        Ok(Self {
            client,
            base,
            token_provider: None,
        })
    }

    /// Called before every request; `None` sends the request unauthenticated.
    pub fn with_token_provider(
        mut self,
        provider: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    fn user_agent() -> &'static str {
        concat!("specchio/", env!("CARGO_PKG_VERSION"))
    }

    fn request_url(&self, request: &RequestDescriptor) -> Result<Url, TransportError> {
        let mut url = self
            .base
            .join(&request.path)
            .map_err(|err| TransportError::network(format!("invalid request path: {err}")))?;
        if !request.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn method_of(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: RequestDescriptor) -> Result<Value, TransportError> {
        let url = self.request_url(&request)?;
        let mut req = self.client.request(method_of(request.method), url);
        if let Some(token) = self.token_provider.as_ref().and_then(|provider| provider()) {
            req = req.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(TransportError::network)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(TransportError::network)?;
        if !status.is_success() {
            let message = String::from_utf8_lossy(&bytes).into_owned();
            return Err(TransportError::status(status.as_u16(), message));
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(TransportError::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_join_onto_the_base() {
        let transport = HttpTransport::new("https://api.example.test").unwrap();
        let url = transport
            .request_url(&RequestDescriptor::get("/blog/viewblogs"))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.test/blog/viewblogs");
    }

    #[test]
    fn params_become_the_query_string() {
        let transport = HttpTransport::new("https://api.example.test").unwrap();
        let request = RequestDescriptor::get("/project/viewprojects")
            .param("city", "Pune")
            .param("page", "2");
        let url = transport.request_url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.test/project/viewprojects?city=Pune&page=2"
        );
    }

    #[test]
    fn base_url_normalizes_to_root() {
        let transport = HttpTransport::new("https://api.example.test/ignored").unwrap();
        let url = transport
            .request_url(&RequestDescriptor::get("/city/getallcities"))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.test/city/getallcities");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(HttpTransport::new("not a url").is_err());
    }

    #[test]
    fn verbs_map_onto_reqwest() {
        assert_eq!(method_of(Method::Get), reqwest::Method::GET);
        assert_eq!(method_of(Method::Delete), reqwest::Method::DELETE);
    }
}
