//! Bundle Commands

/// 上传 bundle 命令
#[derive(Debug, Clone)]
pub struct UploadBundle {
    pub name: String,
    /// 上传时的原始文件名（必须以 .zip 结尾）
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// 删除 bundle 命令
#[derive(Debug, Clone)]
pub struct DeleteBundle {
    pub name: String,
}

/// 清理全部 bundle 命令（服务关闭时使用）
#[derive(Debug, Clone, Copy)]
pub struct PurgeBundles;
