//! HTTP client for the object store holding the GAIA catalog and attachments.
//!
//! Objects live under `<endpoint>/<bucket>/<key>`; reads and writes are plain
//! GET/PUT with optional bearer-token auth.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store endpoint '{endpoint}': {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request for key '{key}' failed: {source}")]
    Http {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    /// The store answered, but not with a 2xx.
    #[error("key '{key}' returned HTTP {status}")]
    Status { key: String, status: u16 },

    #[error("key '{key}' is not valid UTF-8")]
    Utf8 {
        key: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the object-store service.
    pub endpoint: String,
    pub bucket: String,
    /// Key prefix all catalog objects live under.
    pub prefix: String,
    /// Bearer token, supplied out-of-band (not written back to config files).
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://s3.amazonaws.com".to_string(),
            bucket: "gaiaproject".to_string(),
            prefix: "gaia/2023/validation".to_string(),
            token: None,
        }
    }
}

pub struct ObjectStore {
    client: Client,
    base: Url,
    prefix: String,
    token: Option<String>,
}

impl ObjectStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let endpoint = format!(
            "{}/{}/",
            config.endpoint.trim_end_matches('/'),
            config.bucket.trim_matches('/')
        );
        let base = Url::parse(&endpoint).map_err(|source| StoreError::Endpoint {
            endpoint: endpoint.clone(),
            source,
        })?;
        Ok(Self {
            client: Client::new(),
            base,
            prefix: config.prefix.trim_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Full object key for a file name under the configured prefix.
    pub fn key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }

    fn object_url(&self, key: &str) -> Result<Url> {
        self.base
            .join(key.trim_start_matches('/'))
            .map_err(|source| StoreError::Endpoint {
                endpoint: format!("{}{}", self.base, key),
                source,
            })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.object_url(key)?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|source| StoreError::Http { key: key.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { key: key.to_string(), status: status.as_u16() });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| StoreError::Http { key: key.to_string(), source })?;
        Ok(bytes.to_vec())
    }

    pub async fn get_text(&self, key: &str) -> Result<String> {
        let bytes = self.get_object(key).await?;
        decode_text(key, bytes)
    }

    pub async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        let url = self.object_url(key)?;
        let response = self
            .authorize(self.client.put(url))
            .body(body)
            .send()
            .await
            .map_err(|source| StoreError::Http { key: key.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status { key: key.to_string(), status: status.as_u16() });
        }
        Ok(())
    }
}

fn decode_text(key: &str, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|source| StoreError::Utf8 { key: key.to_string(), source })
}
