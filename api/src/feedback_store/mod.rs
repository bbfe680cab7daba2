//! Append-only feedback log kept as one JSON array document.
//!
//! Each append reads the whole document, pushes the record and overwrites the
//! document. Appends inside one relay process are serialized through a mutex;
//! writers in other processes can still interleave and lose records.

mod azure;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use wipowise_core::error::ChatError;
use wipowise_core::feedback::FeedbackRecord;

pub use azure::AzureBlobClient;

use crate::config::FeedbackConfig;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("blob service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Invalid(String),
}

/// Where the feedback document lives.
#[derive(Debug)]
pub enum BlobStore {
    Azure(AzureBlobClient),
    Directory(DirectoryStore),
    #[cfg(test)]
    Memory(memory::MemoryStore),
}

impl BlobStore {
    /// Pick a backend: a storage connection string wins over a local
    /// directory. `Ok(None)` when neither is configured.
    pub fn from_config(config: &FeedbackConfig) -> Result<Option<Self>, String> {
        if let Some(conn) = &config.connection_string {
            return AzureBlobClient::from_connection_string(conn, &config.container)
                .map(|client| Some(BlobStore::Azure(client)));
        }
        Ok(config
            .directory
            .clone()
            .map(|root| BlobStore::Directory(DirectoryStore::new(root))))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BlobStore::Azure(_) => "azure",
            BlobStore::Directory(_) => "directory",
            #[cfg(test)]
            BlobStore::Memory(_) => "memory",
        }
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self {
            BlobStore::Azure(client) => client.get(name).await,
            BlobStore::Directory(dir) => dir.read(name).await,
            #[cfg(test)]
            BlobStore::Memory(mem) => mem.read(name),
        }
    }

    async fn write(&self, name: &str, body: Vec<u8>) -> Result<(), StoreError> {
        match self {
            BlobStore::Azure(client) => client.put(name, body).await,
            BlobStore::Directory(dir) => dir.write(name, body).await,
            #[cfg(test)]
            BlobStore::Memory(mem) => mem.write(name, body),
        }
    }
}

/// Documents as plain files under one directory.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, name: &str, body: Vec<u8>) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(name), body).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct FeedbackLog {
    store: Option<Arc<BlobStore>>,
    document: String,
    writer: Arc<Mutex<()>>,
}

impl FeedbackLog {
    pub fn new(store: Option<BlobStore>, document: impl Into<String>) -> Self {
        Self {
            store: store.map(Arc::new),
            document: document.into(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Build from configuration. An unusable connection string is logged and
    /// leaves the log unconfigured so the relay still starts.
    pub fn from_config(config: &FeedbackConfig) -> Self {
        let store = match BlobStore::from_config(config) {
            Ok(Some(store)) => {
                tracing::info!(
                    store = store.kind(),
                    document = %config.blob,
                    "feedback storage ready"
                );
                Some(store)
            }
            Ok(None) => {
                tracing::warn!("no feedback storage configured; /api/feedback will fail");
                None
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "invalid storage connection string; /api/feedback will fail"
                );
                None
            }
        };
        Self::new(store, config.blob.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&BlobStore, ChatError> {
        self.store
            .as_deref()
            .ok_or_else(|| {
                ChatError::Configuration("Feedback storage is not configured.".to_string())
            })
    }

    /// Current records. Anything unreadable counts as an empty log.
    pub async fn load(&self) -> Result<Vec<Value>, ChatError> {
        let store = self.store()?;
        Ok(read_records(store, &self.document).await)
    }

    /// Append one record and return the new record count. Only a failed
    /// write is reported.
    pub async fn append(&self, record: &FeedbackRecord) -> Result<usize, ChatError> {
        let store = self.store()?;
        let _writer = self.writer.lock().await;

        let mut records = self.load().await?;
        let entry =
            serde_json::to_value(record).map_err(|e| ChatError::Storage(e.to_string()))?;
        records.push(entry);

        let body =
            serde_json::to_vec_pretty(&records).map_err(|e| ChatError::Storage(e.to_string()))?;
        store
            .write(&self.document, body)
            .await
            .map_err(|e| ChatError::Storage(e.to_string()))?;

        tracing::info!(store = store.kind(), records = records.len(), "feedback appended");
        Ok(records.len())
    }
}

async fn read_records(store: &BlobStore, document: &str) -> Vec<Value> {
    let bytes = match store.read(document).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::debug!(document, "feedback document absent; starting a new one");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(document, error = %e, "reading feedback failed; starting over");
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            tracing::warn!(document, "feedback document is not an array; starting over");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(document, error = %e, "feedback document is not JSON; starting over");
            Vec::new()
        }
    }
}
