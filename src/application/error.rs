//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{ArchiveError, RuntimeError};
use crate::domain::function::FunctionError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 超出归档限额
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// 调用超时
    #[error("Invocation timed out: {0}")]
    Timeout(String),

    /// 函数执行失败
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建存储错误
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<FunctionError> for ApplicationError {
    fn from(err: FunctionError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ArchiveError> for ApplicationError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Invalid(_) | ArchiveError::UnsafePath(_) => {
                Self::ValidationError(err.to_string())
            }
            ArchiveError::QuotaExceeded(_) => Self::QuotaExceeded(err.to_string()),
            ArchiveError::IoError(msg) => Self::StorageError(msg),
        }
    }
}

impl From<RuntimeError> for ApplicationError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Timeout(_) => Self::Timeout(err.to_string()),
            other => Self::RuntimeError(other.to_string()),
        }
    }
}
