//! Client for the legacy (11.x) ZenTao JSON endpoints.
//!
//! ZenTao 11 has no REST API. Every page of the web UI answers with a JSON
//! envelope when the path ends in `.json`, authenticated by a session id passed
//! as the `zentaosid` query parameter. [`HttpTransport`] owns the session and
//! the envelope handling; [`ZentaoClient`] builds typed operations on top of
//! any [`Transport`].

pub mod bugs;
pub mod envelope;
pub mod images;
pub mod paginate;
pub mod products;
pub mod relations;
pub mod request;
pub mod search;
pub mod session;
pub mod stories;
pub mod tasks;
pub mod testcases;
pub mod testtasks;


use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Credentials;
use crate::error::{Result, ZentaoError};
use crate::model::{dedup_by_id, Record};
use crate::util::lenient;

pub use request::HttpTransport;

/// Form fields or query parameters.
pub type Params<'a> = [(&'a str, String)];

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a `.json` page and return the decoded `data` payload.
    async fn get(&self, path: &str, query: &Params<'_>) -> Result<Value>;

    /// POST a form. Returns the decoded payload, or the bare envelope when the
    /// endpoint sends none.
    async fn post(&self, path: &str, form: &Params<'_>) -> Result<Value>;

    /// Download a raw file with the session attached.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    fn base_url(&self) -> &str;
}

pub struct ZentaoClient<T = HttpTransport> {
    transport: T,
}

impl ZentaoClient<HttpTransport> {
    pub fn connect(credentials: Credentials) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(credentials)?))
    }
}

impl<T: Transport> ZentaoClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub(crate) async fn fetch(&self, path: &str) -> Result<Value> {
        self.transport.get(path, &[]).await
    }
}

/// Decode the record stored under `key` in a detail view.
pub(crate) fn entity<R: DeserializeOwned>(
    data: &Value,
    key: &str,
    kind: &'static str,
    id: u64,
) -> Result<R> {
    let raw = lenient::object(data, key).ok_or(ZentaoError::NotFound { entity: kind, id })?;
    serde_json::from_value(raw.clone()).map_err(|e| ZentaoError::decode(format!("{kind} #{id}"), e))
}

/// Decode every record of a list view collection, dropping repeated ids.
pub(crate) fn collection<R: DeserializeOwned + Record>(data: &Value, key: &str) -> Result<Vec<R>> {
    let items = lenient::entries(data.get(key))
        .into_iter()
        .map(|raw| {
            serde_json::from_value(raw.clone())
                .map_err(|e| ZentaoError::decode(format!("{key} entry"), e))
        })
        .collect::<Result<Vec<R>>>()?;
    Ok(dedup_by_id(items))
}

/// `name` of the `product` block some detail views carry alongside the record.
pub(crate) fn product_name(data: &Value) -> Option<String> {
    lenient::object(data, "product")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(String::from)
}
