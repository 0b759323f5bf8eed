pub mod http;
pub mod snapshot;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const TWEETS_COLLECTION: &str = "viraltweets";
pub const CATEGORIES_COLLECTION: &str = "tweetcategories";

/// One entry of the discovery feed as served by the record store.
///
/// Every field except `id` is optional upstream. Counts and dates that are
/// missing or malformed deserialize to `None` instead of rejecting the
/// whole collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "tweetContent", alias = "content", default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_handle: Option<String>,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub retweets_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub views_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "_createdDate", default, deserialize_with = "lenient_timestamp")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedDate", default, deserialize_with = "lenient_timestamp")]
    pub updated_date: Option<DateTime<Utc>>,
}

impl TweetRecord {
    pub fn likes(&self) -> u64 {
        self.likes_count.unwrap_or(0)
    }

    pub fn retweets(&self) -> u64 {
        self.retweets_count.unwrap_or(0)
    }

    pub fn views(&self) -> u64 {
        self.views_count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetCategory {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Categories offered in the feed sidebar: active ones, by display order.
pub fn active_categories(categories: &[TweetCategory]) -> Vec<TweetCategory> {
    let mut active: Vec<TweetCategory> = categories
        .iter()
        .filter(|c| c.is_active == Some(true))
        .cloned()
        .collect();
    active.sort_by_key(|c| c.display_order.unwrap_or(0));
    active
}

/// Envelope returned by `get_all`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for RecordPage<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("record store returned HTTP {status} for collection '{collection}'")]
    Status { collection: String, status: u16 },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed payload for collection '{collection}': {source}")]
    Decode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read access to the hosted collections backing the feed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_all<T>(&self, collection: &str) -> Result<RecordPage<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static;

    async fn get_by_id<T>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static;
}

/// The configured record store.
pub enum RecordBackend {
    Http(http::HttpRecordStore),
    Snapshot(snapshot::SnapshotRecordStore),
}

#[async_trait]
impl RecordStore for RecordBackend {
    async fn get_all<T>(&self, collection: &str) -> Result<RecordPage<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match self {
            RecordBackend::Http(store) => store.get_all(collection).await,
            RecordBackend::Snapshot(store) => store.get_all(collection).await,
        }
    }

    async fn get_by_id<T>(&self, collection: &str, id: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match self {
            RecordBackend::Http(store) => store.get_by_id(collection, id).await,
            RecordBackend::Snapshot(store) => store.get_by_id(collection, id).await,
        }
    }
}

/// Tweets and categories loaded together for the home feed.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub tweets: Vec<TweetRecord>,
    pub categories: Vec<TweetCategory>,
}

impl Feed {
    /// Fetch both collections concurrently. A failed fetch is logged and
    /// leaves an empty feed, which the filter engine treats as ordinary input.
    pub async fn load<S: RecordStore>(store: &S) -> Self {
        let result = futures::try_join!(
            store.get_all::<TweetRecord>(TWEETS_COLLECTION),
            store.get_all::<TweetCategory>(CATEGORIES_COLLECTION),
        );

        match result {
            Ok((tweets, categories)) => {
                tracing::debug!(
                    tweets = tweets.items.len(),
                    categories = categories.items.len(),
                    "feed loaded"
                );
                Self {
                    tweets: tweets.items,
                    categories: active_categories(&categories.items),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "error loading feed data");
                Self::default()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(u64),
    Float(f64),
    Other(#[allow(dead_code)] IgnoredAny),
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<RawCount>::deserialize(deserializer)? {
        Some(RawCount::Int(n)) => Some(n),
        Some(RawCount::Float(f)) if f.is_finite() && f >= 0.0 => Some(f.round() as u64),
        Some(RawCount::Float(_)) | Some(RawCount::Other(_)) | None => None,
    };
    Ok(count)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
    Other(#[allow(dead_code)] IgnoredAny),
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let ts = match Option::<RawTimestamp>::deserialize(deserializer)? {
        Some(RawTimestamp::Text(s)) => parse_timestamp(&s),
        Some(RawTimestamp::Millis(ms)) => DateTime::from_timestamp_millis(ms),
        Some(RawTimestamp::Other(_)) | None => None,
    };
    Ok(ts)
}

/// Parse the date shapes the record store emits: RFC 3339, a naive
/// date-time (taken as UTC), or a bare `YYYY-MM-DD`.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
