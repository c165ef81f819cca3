//! Implements SessionStorePort using a JSON file.
//!
//! Holds the last selected group code under the `last_group` key.

use crate::domain::DomainError;
use crate::ports::SessionStorePort;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateData {
    #[serde(default)]
    last_group: Option<String>,
}

/// JSON file-based client state.
pub struct StateJson {
    path: std::path::PathBuf,
    cache: tokio::sync::RwLock<StateData>,
}

impl StateJson {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: tokio::sync::RwLock::new(StateData::default()),
        }
    }

    /// Load state from disk. A missing or corrupt file yields empty state.
    pub async fn load(&self) -> Result<(), DomainError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
            Err(_) => StateData::default(),
        };
        *self.cache.write().await = data;
        Ok(())
    }

    /// Write to a temp file, sync, then rename over the target.
    async fn save(&self) -> Result<(), DomainError> {
        let data = self.cache.read().await;
        let json =
            serde_json::to_string_pretty(&*data).map_err(|e| DomainError::State(e.to_string()))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| DomainError::State(format!("create state dir: {}", e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::State(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::State(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::State(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::State(format!("atomic rename failed: {}", e)))?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStorePort for StateJson {
    async fn last_group(&self) -> Result<Option<String>, DomainError> {
        Ok(self.cache.read().await.last_group.clone())
    }

    async fn set_last_group(&self, code: &str) -> Result<(), DomainError> {
        {
            let mut cache = self.cache.write().await;
            cache.last_group = Some(code.to_string());
        }
        self.save().await
    }
}
