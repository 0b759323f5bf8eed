use crate::filter::CategoryMode;
use crate::records::http::HttpRecordStore;
use crate::records::snapshot::SnapshotRecordStore;
use crate::records::RecordBackend;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub bookmarks: BookmarksConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub member: MemberConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Http,
    #[default]
    Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            base_url: None,
            token: None,
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarksConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for BookmarksConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub category_mode: CategoryMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberConfig {
    #[serde(default)]
    pub name: Option<String>,
}

impl StoreConfig {
    pub fn open(&self) -> Result<RecordBackend> {
        match self.kind {
            StoreKind::Http => {
                let base_url = self
                    .base_url
                    .as_deref()
                    .context("[store] kind = \"http\" requires base_url")?;
                Ok(RecordBackend::Http(HttpRecordStore::new(
                    base_url,
                    self.token.clone(),
                )))
            }
            StoreKind::Snapshot => Ok(RecordBackend::Snapshot(SnapshotRecordStore::new(
                self.snapshot_dir.clone(),
            ))),
        }
    }
}

fn default_snapshot_dir() -> PathBuf {
    config_home().join("snapshot")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("searchx"))
        .unwrap_or_else(|| config_home().join("data"))
}

fn config_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".searchx")
}

impl Config {
    pub fn default_path() -> PathBuf {
        config_home().join("config.toml")
    }

    /// Read the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store.kind == StoreKind::Http && self.store.base_url.is_none() {
            anyhow::bail!("[store] kind = \"http\" requires base_url");
        }
        Ok(())
    }
}
