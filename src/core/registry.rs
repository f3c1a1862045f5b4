//! 用户注册表
//!
//! 记录所有与机器人交互过的用户，启动时从文件加载，
//! 每新增一个成员立即整体写回文件

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::domain::UserId;

/// 注册表错误
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed registry file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode registry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 注册表文件格式：`{ "users": [1, 2, 3] }`
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    users: Vec<UserId>,
}

/// 加载结果
#[derive(Debug)]
pub enum RegistryLoad {
    /// 成功读取
    Loaded(BTreeSet<UserId>),
    /// 文件不存在
    Missing,
    /// 文件无法读取或内容损坏，按空注册表处理
    Corrupt(RegistryError),
}

impl RegistryLoad {
    pub fn into_users(self) -> BTreeSet<UserId> {
        match self {
            RegistryLoad::Loaded(users) => users,
            RegistryLoad::Missing | RegistryLoad::Corrupt(_) => BTreeSet::new(),
        }
    }
}

/// 从文件加载用户集合
///
/// 文件缺失或损坏都不会返回错误，损坏时记录日志
pub async fn load(path: &Path) -> RegistryLoad {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "registry file not found, starting empty");
            return RegistryLoad::Missing;
        }
        Err(e) => {
            let err = RegistryError::Io {
                path: path.to_path_buf(),
                source: e,
            };
            error!(error = %err, "failed to read registry file, starting empty");
            return RegistryLoad::Corrupt(err);
        }
    };

    match serde_json::from_str::<RegistryFile>(&content) {
        Ok(file) => RegistryLoad::Loaded(file.users.into_iter().collect()),
        Err(e) => {
            let err = RegistryError::Malformed {
                path: path.to_path_buf(),
                source: e,
            };
            error!(error = %err, "failed to parse registry file, starting empty");
            RegistryLoad::Corrupt(err)
        }
    }
}

/// 将完整集合写入文件（排序、格式化 JSON）
///
/// 先写同目录临时文件再 rename 覆盖，目标文件不会出现截断内容
pub async fn persist(path: &Path, users: &BTreeSet<UserId>) -> Result<(), RegistryError> {
    let io_err = |source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let payload = RegistryFile {
        users: users.iter().copied().collect(),
    };
    let mut encoded = serde_json::to_string_pretty(&payload)?;
    encoded.push('\n');

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, encoded)
        .await
        .map_err(io_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(io_err)?;

    Ok(())
}

/// 用户注册表
///
/// 内存集合与文件由同一把锁保护，插入和写回在锁内完成
pub struct UserRegistry {
    path: PathBuf,
    users: Mutex<BTreeSet<UserId>>,
}

impl UserRegistry {
    /// 打开注册表，加载已有用户
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let users = load(&path).await.into_users();
        info!(path = %path.display(), users = users.len(), "user registry loaded");
        Self {
            path,
            users: Mutex::new(users),
        }
    }

    /// 记录用户，返回是否为新成员
    ///
    /// 新成员会立即写回文件；写回失败时内存中仍保留该成员，
    /// 失败在此记录一次，调用方无需重复记录
    pub async fn record(&self, id: UserId) -> Result<bool, RegistryError> {
        let mut users = self.users.lock().await;
        if !users.insert(id) {
            return Ok(false);
        }

        debug!(user_id = %id, total = users.len(), "new user recorded");
        if let Err(e) = persist(&self.path, &users).await {
            error!(user_id = %id, error = %e, "failed to persist user registry");
            return Err(e);
        }
        Ok(true)
    }

    /// 当前用户数
    pub async fn count(&self) -> usize {
        self.users.lock().await.len()
    }

    /// 是否包含某用户
    pub async fn contains(&self, id: UserId) -> bool {
        self.users.lock().await.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load(&dir.path().join("users.json")).await;
        assert!(matches!(loaded, RegistryLoad::Missing));
        assert!(loaded.into_users().is_empty());
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let loaded = load(&path).await;
        assert!(matches!(
            loaded,
            RegistryLoad::Corrupt(RegistryError::Malformed { .. })
        ));
        assert!(loaded.into_users().is_empty());
    }

    #[tokio::test]
    async fn test_load_without_users_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        tokio::fs::write(&path, "{}").await.unwrap();

        assert!(load(&path).await.into_users().is_empty());
    }

    #[tokio::test]
    async fn test_persist_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.json");
        let users: BTreeSet<UserId> = [UserId(42), UserId(7), UserId(100)].into();

        persist(&path, &users).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, serde_json::json!({ "users": [7, 42, 100] }));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_record_returns_whether_new() {
        let dir = tempfile::tempdir().unwrap();
        let registry = UserRegistry::open(dir.path().join("users.json")).await;

        assert!(registry.record(UserId(1)).await.unwrap());
        assert!(!registry.record(UserId(1)).await.unwrap());
        assert_eq!(registry.count().await, 1);
        assert!(registry.contains(UserId(1)).await);
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_persist_failure_logged_once_at_error() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        tokio::fs::write(&blocker, "not a directory").await.unwrap();
        let registry = UserRegistry::open(blocker.join("users.json")).await;

        assert!(registry.record(UserId(9)).await.is_err());

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output
            .lines()
            .filter(|line| line.contains("failed to persist user registry"))
            .collect();
        assert_eq!(lines.len(), 1, "{}", output);
        assert!(lines[0].contains("ERROR"), "{}", output);
    }
}
