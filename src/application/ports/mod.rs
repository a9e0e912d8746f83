//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod bundle_archive;
mod bundle_registry;
mod function_runtime;

pub use bundle_archive::{
    ArchiveError, ArchiveQuotas, BundleArchivePort, ExtractSummary, PackedArchive,
};
pub use bundle_registry::BundleRegistryPort;
pub use function_runtime::{FunctionRuntimePort, InvocationOutput, RuntimeError};
