//! Archive Path Validation
//!
//! 解压前校验条目路径，防止写出到 bundle 目录之外

use std::path::{Component, Path};
use tracing::warn;

use crate::application::ports::ArchiveError;

/// 条目路径校验器
pub struct PathValidator;

impl PathValidator {
    /// 校验条目路径安全性
    pub fn validate(path: &str) -> Result<(), ArchiveError> {
        if Self::is_unsafe_path(path) {
            warn!("Unsafe path detected in archive: {}", path);
            return Err(ArchiveError::UnsafePath(path.to_string()));
        }
        Ok(())
    }

    fn is_unsafe_path(path: &str) -> bool {
        path.is_empty()
            || Self::has_directory_traversal(path)
            || Self::is_absolute_path(path)
            || Self::has_control_characters(path)
    }

    /// `..` 组件（同时处理 `/` 和 `\` 分隔符）
    fn has_directory_traversal(path: &str) -> bool {
        path.split(['/', '\\']).any(|part| part == "..")
    }

    fn is_absolute_path(path: &str) -> bool {
        if path.starts_with('/') || path.starts_with('\\') {
            return true;
        }

        // Windows 盘符 (C:, D:, ...)
        let bytes = path.as_bytes();
        if bytes.len() > 1 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            return true;
        }

        Path::new(path)
            .components()
            .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
    }

    fn has_control_characters(path: &str) -> bool {
        path.chars().any(|c| c.is_control())
    }
}
