//! Memory Layer - In-Memory State Management
//!
//! 已上传函数 bundle 的内存注册表

mod bundle_registry;

pub use bundle_registry::InMemoryBundleRegistry;
