//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod archive;
pub mod http;
pub mod memory;
pub mod runtime;

pub use archive::ZipBundleArchive;
pub use memory::InMemoryBundleRegistry;
pub use runtime::PolyglotRuntime;
