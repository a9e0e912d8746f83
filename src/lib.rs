//! polyfaas - 多语言函数运行时
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Function Context: handler 名称、语言、元数据和 bundle 聚合
//!
//! 应用层 (application/):
//! - Ports: 端口定义（BundleRegistry, BundleArchive, FunctionRuntime）
//! - Commands: 上传、删除、调用
//! - Queries: 元数据、列表、导出
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + OpenAPI 文档
//! - Memory: BundleRegistry 内存实现
//! - Archive: ZIP 解压与打包
//! - Runtime: WASM (wasmtime + WASI) 与脚本解释器

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
