//! Invoke Commands

/// 调用函数命令
#[derive(Debug, Clone)]
pub struct InvokeFunction {
    pub name: String,
    /// 原样传给处理器 stdin 的请求体
    pub input: Vec<u8>,
}
