//! Bundle Registry Port - 已注册函数的存储
//!
//! 定义 bundle 注册表的抽象接口，具体实现在 infrastructure/memory 层

use std::sync::Arc;

use crate::domain::function::{FunctionBundle, FunctionName};

/// Bundle Registry Port
///
/// 按名称保存已上传的函数 bundle，所有状态存储在内存中。
/// bundle 以 `Arc` 共享，被替换或注销的 bundle 在最后一个引用释放后才清理工作目录
pub trait BundleRegistryPort: Send + Sync {
    /// 注册 bundle，返回被替换的旧 bundle（如果有）
    fn insert(&self, bundle: FunctionBundle) -> Option<Arc<FunctionBundle>>;

    /// 按名称获取
    fn get(&self, name: &FunctionName) -> Option<Arc<FunctionBundle>>;

    /// 注销 bundle
    fn remove(&self, name: &FunctionName) -> Option<Arc<FunctionBundle>>;

    /// 获取全部 bundle，按名称排序
    fn list(&self) -> Vec<Arc<FunctionBundle>>;

    /// 已注册数量
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
