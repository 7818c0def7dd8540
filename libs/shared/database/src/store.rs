use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store conflict: {0}")]
    Conflict(String),

    #[error("Store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Store transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Thin client for the document store's REST query interface. One
/// collection per entity; filters use the store's `field=op.value` syntax.
pub struct StoreClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl StoreClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_url.clone(),
            service_key: config.database_service_key.clone(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", value);
        }
        headers
    }

    async fn request<T>(
        &self,
        method: Method,
        collection: &str,
        query: Option<&str>,
        body: Option<Value>,
        returning: bool,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut url = format!("{}/{}", self.base_url, collection);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        debug!("Store request: {} {}", method, url);

        let mut headers = self.headers();
        if returning {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, message);
            if status == StatusCode::CONFLICT {
                return Err(StoreError::Conflict(message));
            }
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }

    /// Fetch every document in `collection` matching `query`.
    pub async fn find<T>(&self, collection: &str, query: &str) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, collection, Some(query), None, false)
            .await
    }

    /// Fetch the first document matching `query`, if any.
    pub async fn find_one<T>(&self, collection: &str, query: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut matches: Vec<T> = self.find(collection, query).await?;
        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.remove(0)))
        }
    }

    /// Insert one document. Unique-index violations surface as
    /// `StoreError::Conflict` straight from the store, so check-then-insert
    /// callers are still race-safe.
    pub async fn insert<T>(&self, collection: &str, document: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut created: Vec<T> = self
            .request(Method::POST, collection, None, Some(document), true)
            .await?;
        if created.is_empty() {
            return Err(StoreError::Api {
                status: 500,
                message: format!("Insert into {} returned no representation", collection),
            });
        }
        Ok(created.remove(0))
    }

    /// Patch every document matching `query`; returns the updated documents.
    /// An empty result means nothing matched.
    pub async fn update<T>(
        &self,
        collection: &str,
        query: &str,
        changes: Value,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, collection, Some(query), Some(changes), true)
            .await
    }
}
