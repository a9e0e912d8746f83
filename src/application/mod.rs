//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（BundleRegistry、BundleArchive、FunctionRuntime）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    DeleteBundle,
    InvokeFunction,
    PurgeBundles,
    UploadBundle,
    // Handlers
    handlers::{
        DeleteBundleHandler, InvokeFunctionHandler, InvokeFunctionResponse, PurgeBundlesHandler,
        UploadBundleHandler, UploadBundleResponse, SCRATCH_DIR_PREFIX,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Archive
    ArchiveError,
    ArchiveQuotas,
    BundleArchivePort,
    ExtractSummary,
    PackedArchive,
    // Registry
    BundleRegistryPort,
    // Runtime
    FunctionRuntimePort,
    InvocationOutput,
    RuntimeError,
};

pub use queries::{
    ExportBundle,
    GetBundle,
    ListBundles,
    // Handlers
    handlers::{
        BundleSummary, ExportBundleHandler, ExportBundleResponse, GetBundleHandler,
        ListBundlesHandler,
    },
};
