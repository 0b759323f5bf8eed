use super::{RecordPage, RecordStore, StoreError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Record store backed by exported collection files, one
/// `{collection}.json` per collection holding `{"items": [...]}`.
pub struct SnapshotRecordStore {
    dir: PathBuf,
}

impl SnapshotRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection))
    }

    /// Raw items of a collection. A collection that was never exported is empty.
    async fn read_items(&self, collection: &str) -> Result<Vec<serde_json::Value>, StoreError> {
        let path = self.collection_path(collection);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no snapshot for collection");
                return Ok(Vec::new());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let page: RecordPage<serde_json::Value> =
            serde_json::from_str(&body).map_err(|source| StoreError::Decode {
                collection: collection.to_string(),
                source,
            })?;
        Ok(page.items)
    }
}

fn decode_items<T: DeserializeOwned>(
    collection: &str,
    items: Vec<serde_json::Value>,
) -> Result<Vec<T>, StoreError> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|source| StoreError::Decode {
                collection: collection.to_string(),
                source,
            })
        })
        .collect()
}

#[async_trait]
impl RecordStore for SnapshotRecordStore {
    async fn get_all<T>(&self, collection: &str) -> Result<RecordPage<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let items = self.read_items(collection).await?;
        Ok(RecordPage {
            items: decode_items(collection, items)?,
        })
    }

    async fn get_by_id<T>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let found = self
            .read_items(collection)
            .await?
            .into_iter()
            .find(|item| item.get("_id").and_then(|v| v.as_str()) == Some(id));

        match found {
            Some(item) => decode_items(collection, vec![item]).map(|mut v| v.pop()),
            None => Ok(None),
        }
    }
}
