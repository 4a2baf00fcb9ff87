//! 状态存储抽象层
//!
//! 统一的键值存储接口（值为 JSON），支持内存和文件两种实现。
//! 会话级、用户级状态都以整块 JSON 的形式存在一个键下。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::{StorageBackend, StorageSection};

/// 一次读写涉及的键值集合
pub type StoreItems = HashMap<String, Value>;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored item is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 键值存储接口
#[async_trait]
pub trait Storage: Send + Sync {
    /// 读取若干键；不存在的键不出现在结果中
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError>;

    /// 写入（覆盖）若干键
    async fn write(&self, changes: StoreItems) -> Result<(), StorageError>;

    /// 删除若干键；不存在的键忽略
    async fn delete(&self, keys: &[String]) -> Result<(), StorageError>;
}

/// 内存存储（进程退出即丢失）
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保存的键数量
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError> {
        let items = self.items.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| items.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn write(&self, changes: StoreItems) -> Result<(), StorageError> {
        self.items.write().await.extend(changes);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        for key in keys {
            items.remove(key);
        }
        Ok(())
    }
}

/// 文件存储：目录下每个键一个 JSON 文件，先写临时文件再改名
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn read(&self, keys: &[String]) -> Result<StoreItems, StorageError> {
        let mut found = StoreItems::new();
        for key in keys {
            let path = self.path_for(key);
            let data = match tokio::fs::read_to_string(&path).await {
                Ok(data) => data,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            found.insert(key.clone(), serde_json::from_str(&data)?);
        }
        Ok(found)
    }

    async fn write(&self, changes: StoreItems) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;

        // 先写完所有临时文件，任何一个失败都不改动已有记录
        let mut staged = Vec::with_capacity(changes.len());
        for (key, value) in &changes {
            let path = self.path_for(key);
            let tmp = path.with_extension("json.tmp");
            let written = match serde_json::to_string_pretty(value) {
                Ok(data) => tokio::fs::write(&tmp, data).await.map_err(StorageError::from),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = written {
                for (tmp, _) in &staged {
                    let _ = tokio::fs::remove_file(tmp).await;
                }
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e);
            }
            staged.push((tmp, path));
        }

        for (tmp, path) in staged {
            tokio::fs::rename(&tmp, &path).await?;
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            match tokio::fs::remove_file(self.path_for(key)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// 将存储键转换为安全的文件名
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 按配置创建存储
pub fn create_storage(section: &StorageSection) -> Arc<dyn Storage> {
    match section.backend {
        StorageBackend::File => {
            tracing::info!("Using file storage: {:?}", section.path);
            Arc::new(FileStorage::new(&section.path))
        }
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            Arc::new(MemoryStorage::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(pairs: &[(&str, Value)]) -> StoreItems {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_memory_storage_read_write_delete() {
        let storage = MemoryStorage::new();
        storage
            .write(items(&[("a", json!({"n": 1})), ("b", json!("x"))]))
            .await
            .unwrap();

        let read = storage
            .read(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read["a"], json!({"n": 1}));

        storage.delete(&["a".to_string(), "missing".to_string()]).await.unwrap();
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_file_storage_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let key = "console/users/alice".to_string();

        FileStorage::new(dir.path())
            .write(items(&[(key.as_str(), json!({"guest": {"name": "Alice", "room": "12"}}))]))
            .await
            .unwrap();

        let reopened = FileStorage::new(dir.path());
        let read = reopened.read(&[key.clone()]).await.unwrap();
        assert_eq!(read[&key]["guest"]["room"], "12");

        reopened.delete(&[key.clone()]).await.unwrap();
        assert!(reopened.read(&[key]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_storage_rejects_corrupt_item() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let storage = FileStorage::new(dir.path());
        let result = storage.read(&["broken".to_string()]).await;
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("console/users/u-1"), "console_users_u-1");
        assert_eq!(sanitize_key("web/conversations/a.b"), "web_conversations_a_b");
    }
}
