//! Transport seam between the client and the network.
//!
//! `ReqwestTransport` speaks JSON:API over HTTP. Any other `Transport`
//! (see `testing::ScriptedTransport`) can stand in for it.

use crate::{ClientConfig, TransportError};
use async_trait::async_trait;
use lattice_core::TransportReply;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use tracing::debug;

pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub token: Option<String>,
    pub body: Option<Value>,
    pub cache_policy: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            token: None,
            body: None,
            cache_policy: None,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<TransportReply, TransportError>;
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|error| {
                TransportError::Configuration(format!("failed to build http client: {error}"))
            })?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<TransportReply, TransportError> {
        let FetchRequest {
            method,
            url,
            token,
            body,
            cache_policy,
        } = request;

        let mut builder = self
            .client
            .request(method.into(), &url)
            .header(ACCEPT, HeaderValue::from_static(JSON_API_MEDIA_TYPE));
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(policy) = cache_policy {
            builder = builder.header(CACHE_CONTROL, policy);
        }
        if let Some(body) = body {
            let bytes = serde_json::to_vec(&body)
                .map_err(|error| TransportError::Decode(error.to_string()))?;
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static(JSON_API_MEDIA_TYPE))
                .body(bytes);
        }

        let response = builder.send().await.map_err(|error| {
            TransportError::Request(format!("{} {url} failed: {error}", method.as_str()))
        })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| TransportError::Decode(error.to_string()))?;
        debug!(
            method = method.as_str(),
            url = %url,
            status = status.as_u16(),
            "fetched"
        );

        Ok(TransportReply {
            ok: status.is_success(),
            status: status.as_u16(),
            data: decode_body(text),
        })
    }
}

/// Empty bodies (204) decode to null; non-JSON bodies are kept as a string.
pub(crate) fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
