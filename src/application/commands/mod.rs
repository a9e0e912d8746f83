//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：上传、删除、调用

mod bundle_commands;
mod invoke_commands;

pub mod handlers;

pub use bundle_commands::*;
pub use invoke_commands::*;
