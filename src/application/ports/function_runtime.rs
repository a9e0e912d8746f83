//! Function Runtime Port - 函数执行抽象
//!
//! 请求体作为 stdin 传入处理器，处理器的 stdout 即响应

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::function::{FunctionBundle, FunctionName, Language};

/// 运行时错误
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Entrypoint file does not exist: {0}")]
    EntrypointMissing(String),

    #[error("Failed to compile module: {0}")]
    Compile(String),

    #[error("No exported function '{export}' found in WASM module; the list of exported functions is: {available:?}")]
    ExportNotFound {
        export: String,
        available: Vec<String>,
    },

    #[error("Handler exited with code {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("Handler trapped: {0}")]
    Trap(String),

    #[error("Handler output exceeds limit of {0} bytes")]
    OutputLimit(usize),

    #[error("Handler timed out after {0} ms")]
    Timeout(u64),

    #[error("Runtime unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported language: {0}")]
    Unsupported(Language),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::IoError(err.to_string())
    }
}

/// 调用结果
#[derive(Debug, Clone)]
pub struct InvocationOutput {
    /// 处理器写到 stdout 的内容
    pub stdout: Vec<u8>,
    /// 执行耗时（毫秒）
    pub duration_ms: u64,
}

/// Function Runtime Port
#[async_trait]
pub trait FunctionRuntimePort: Send + Sync {
    /// 是否支持该语言
    fn supports(&self, language: Language) -> bool;

    /// 调用函数
    async fn invoke(
        &self,
        bundle: &FunctionBundle,
        input: Vec<u8>,
    ) -> Result<InvocationOutput, RuntimeError>;

    /// 释放该函数的缓存（bundle 被替换或删除时调用）
    fn evict(&self, _name: &FunctionName) {}
}
