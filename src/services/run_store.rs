//! 运行记录存储
//!
//! 可注入的键值存储接口，调度器在每次运行结束时写入一条 `RunStats`。

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, AppResult};

/// 键值存储接口
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn put(&self, key: &str, value: JsonValue) -> AppResult<()>;
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>>;
    async fn keys(&self) -> AppResult<Vec<String>>;
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    entries: RwLock<HashMap<String, JsonValue>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn put(&self, key: &str, value: JsonValue) -> AppResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// 单个 JSON 文件存储
///
/// 每次 `put` 先写临时文件再重命名，文件内容始终是完整的 JSON 对象。
#[derive(Debug)]
pub struct JsonFileRunStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> AppResult<BTreeMap<String, JsonValue>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(AppError::io(self.path.display().to_string(), e)),
        }
    }
}

#[async_trait]
impl RunStore for JsonFileRunStore {
    async fn put(&self, key: &str, value: JsonValue) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::io(parent.display().to_string(), e))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| AppError::io(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| AppError::io(self.path.display().to_string(), e))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        Ok(self.load().await?.remove(key))
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        Ok(self.load().await?.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_put_get() {
        let store = MemoryRunStore::new();
        store.put("b", json!({"total": 2})).await.unwrap();
        store.put("a", json!({"total": 1})).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(json!({"total": 1})));
        assert_eq!(store.get("missing").await.unwrap(), None);
        assert_eq!(store.keys().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_json_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("runs.json");

        let store = JsonFileRunStore::new(&path);
        assert!(store.keys().await.unwrap().is_empty());
        store.put("run-1", json!({"total": 3})).await.unwrap();
        store.put("run-2", json!({"total": 5})).await.unwrap();

        let reopened = JsonFileRunStore::new(&path);
        assert_eq!(reopened.get("run-2").await.unwrap(), Some(json!({"total": 5})));
        assert_eq!(reopened.keys().await.unwrap(), vec!["run-1", "run-2"]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_json_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileRunStore::new(&path);
        assert!(matches!(store.get("x").await, Err(AppError::Json(_))));
    }
}
