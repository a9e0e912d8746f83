//! Bundle Queries

/// 获取 bundle 详情查询
#[derive(Debug, Clone)]
pub struct GetBundle {
    pub name: String,
}

/// 列出所有 bundle 查询
#[derive(Debug, Clone)]
pub struct ListBundles;

/// 导出 bundle 为 ZIP 查询
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub name: String,
}
