//! Function Context - 函数限界上下文
//!
//! 职责:
//! - 函数名称与语言
//! - bundle 元数据 (metadata.json)
//! - 已注册的 FunctionBundle 及其工作目录

mod aggregate;
mod errors;
mod value_objects;
mod work_dir;

pub use aggregate::FunctionBundle;
pub use errors::FunctionError;
pub use value_objects::{FunctionMetadata, FunctionName, Language};
pub use work_dir::WorkDir;
