// Document storage module
// Persists the single JSON document to disk and serializes access to it

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::fs;
use tokio::sync::RwLock;

use crate::logger;

/// Default document written when the storage file is absent
fn default_document() -> Value {
    json!({ "municipios": [] })
}

/// Store for the single persisted JSON document
///
/// The original data model is one opaque JSON blob with no schema. Every
/// replace takes the write lock for the full serialize-and-write, so
/// concurrent writers cannot interleave at the byte level; last writer wins
/// at the request level.
pub struct DocumentStore {
    /// Path to the document file
    data_path: PathBuf,
    /// Guards the read-modify-replace cycle on the file
    lock: RwLock<()>,
}

impl DocumentStore {
    /// Create a store for the document at `data_path`
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Create the containing directory and, if the file is absent, write the
    /// default document `{"municipios": []}`
    pub async fn ensure_exists(&self) -> Result<(), String> {
        let _guard = self.lock.write().await;
        self.ensure_exists_locked().await
    }

    /// Read the current document, creating the default one first if absent
    ///
    /// A file holding invalid JSON (e.g. from a prior interrupted write)
    /// surfaces as an error; there is no backup to restore from.
    pub async fn read(&self) -> Result<Value, String> {
        if !self.data_path.exists() {
            let _guard = self.lock.write().await;
            self.ensure_exists_locked().await?;
        }

        let _guard = self.lock.read().await;
        let content = fs::read_to_string(&self.data_path)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", self.data_path.display()))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {e}", self.data_path.display()))
    }

    /// Overwrite the document wholesale with `document`
    ///
    /// No merge with the previous contents and no backup of them.
    pub async fn replace(&self, document: &Value) -> Result<(), String> {
        let _guard = self.lock.write().await;

        self.ensure_dir_locked().await?;

        let content = serde_json::to_string_pretty(document)
            .map_err(|e| format!("Failed to serialize document: {e}"))?;

        fs::write(&self.data_path, content)
            .await
            .map_err(|e| format!("Failed to write {}: {e}", self.data_path.display()))
    }

    /// Path of the storage file
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    async fn ensure_dir_locked(&self) -> Result<(), String> {
        if let Some(parent) = self.data_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
            }
        }
        Ok(())
    }

    async fn ensure_exists_locked(&self) -> Result<(), String> {
        self.ensure_dir_locked().await?;

        if !self.data_path.exists() {
            let content = serde_json::to_string_pretty(&default_document())
                .map_err(|e| format!("Failed to serialize default document: {e}"))?;
            fs::write(&self.data_path, content)
                .await
                .map_err(|e| format!("Failed to write {}: {e}", self.data_path.display()))?;
            logger::log_storage_initialized(&self.data_path);
        }
        Ok(())
    }
}

/// Wrapper for Arc<DocumentStore>
pub type SharedDocumentStore = Arc<DocumentStore>;

/// Create a shared document store
pub fn create_document_store(data_file: &str) -> SharedDocumentStore {
    Arc::new(DocumentStore::new(data_file))
}
