use super::{RecordPage, RecordStore, StoreError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Record store reached over HTTP.
///
/// Collections are served at `{base}/collections/{name}/items` and single
/// records at `{base}/collections/{name}/items/{id}`.
pub struct HttpRecordStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpRecordStore {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("searchx/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        }
    }

    fn items_url(&self, collection: &str) -> String {
        format!(
            "{}/collections/{}/items",
            self.base_url,
            urlencoding::encode(collection)
        )
    }

    fn item_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.items_url(collection),
            urlencoding::encode(id)
        )
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response, StoreError> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        tracing::debug!(url, "record store request");
        Ok(request.send().await?)
    }
}

fn decode<T: DeserializeOwned>(collection: &str, body: &str) -> Result<T, StoreError> {
    serde_json::from_str(body).map_err(|source| StoreError::Decode {
        collection: collection.to_string(),
        source,
    })
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn get_all<T>(&self, collection: &str) -> Result<RecordPage<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.fetch(&self.items_url(collection)).await?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                collection: collection.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        decode(collection, &body)
    }

    async fn get_by_id<T>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.fetch(&self.item_url(collection, id)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Status {
                collection: collection.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        decode(collection, &body).map(Some)
    }
}
