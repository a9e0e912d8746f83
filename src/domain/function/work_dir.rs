//! Bundle 工作目录

use std::path::{Path, PathBuf};

/// bundle 解压所在的工作目录
///
/// `owned` 目录归 bundle 所有，bundle 释放时随之删除。
/// 注册表以 `Arc<FunctionBundle>` 共享 bundle，
/// 因此进行中的调用结束前目录不会被删除。
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    owned: bool,
}

impl WorkDir {
    /// 释放时删除的目录
    pub fn owned(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: true,
        }
    }

    /// 由外部管理的目录，释放时保留
    pub fn external(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl From<PathBuf> for WorkDir {
    fn from(path: PathBuf) -> Self {
        Self::external(path)
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {
                tracing::debug!(work_dir = %self.path.display(), "Bundle directory removed");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    work_dir = %self.path.display(),
                    error = %e,
                    "Failed to remove bundle directory"
                );
            }
        }
    }
}
