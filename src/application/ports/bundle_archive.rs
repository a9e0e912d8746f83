//! Bundle Archive Port - ZIP 归档读写
//!
//! 上传时解压 bundle，导出时重新打包

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// 归档错误
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid zip archive: {0}")]
    Invalid(String),

    #[error("Archive contains unsafe path: {0}")]
    UnsafePath(String),

    #[error("Archive quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::IoError(err.to_string())
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => ArchiveError::IoError(e.to_string()),
            other => ArchiveError::Invalid(other.to_string()),
        }
    }
}

/// 解压限额
#[derive(Debug, Clone)]
pub struct ArchiveQuotas {
    pub max_entries: usize,
    pub max_entry_size: u64,
    pub max_total_size: u64,
}

impl Default for ArchiveQuotas {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_entry_size: 64 * 1024 * 1024,  // 64MB
            max_total_size: 256 * 1024 * 1024, // 256MB
        }
    }
}

/// 解压结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// 写出的文件数（不含目录）
    pub file_count: usize,
    /// 解压后总字节数
    pub total_size: u64,
}

/// 打包好的 ZIP（匿名临时文件，游标已回到开头）
#[derive(Debug)]
pub struct PackedArchive {
    pub file: std::fs::File,
    pub size: u64,
}

/// Bundle Archive Port
#[async_trait]
pub trait BundleArchivePort: Send + Sync {
    /// 将内存中的 ZIP 解压到 dest
    async fn extract(&self, data: Vec<u8>, dest: &Path) -> Result<ExtractSummary, ArchiveError>;

    /// 将目录打包为 ZIP
    async fn pack(&self, source_dir: &Path) -> Result<PackedArchive, ArchiveError>;
}
