//! Domain Layer - 领域层
//!
//! 限界上下文:
//! - Function Context: 函数 bundle 管理

pub mod function;
