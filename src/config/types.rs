//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::function::Language;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// Bundle 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// ZIP 归档限额
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// 函数运行时配置
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 上传请求体最大大小（字节）
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,

    /// 是否暴露 OpenAPI 文档
    #[serde(default = "default_openapi_enabled")]
    pub openapi_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_size() -> usize {
    50 * 1024 * 1024 // 50 MB
}

fn default_openapi_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_size: default_max_upload_size(),
            openapi_enabled: default_openapi_enabled(),
        }
    }
}

/// Bundle 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 解压工作目录，每次上传在其下创建 `polyglot-faas-*` 临时目录
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// 关闭时是否清理所有已解压的 bundle
    #[serde(default = "default_cleanup_on_shutdown")]
    pub cleanup_on_shutdown: bool,
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_cleanup_on_shutdown() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            cleanup_on_shutdown: default_cleanup_on_shutdown(),
        }
    }
}

/// ZIP 归档限额
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// 最大条目数
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// 单个条目解压后最大大小（字节）
    #[serde(default = "default_max_entry_size")]
    pub max_entry_size: u64,

    /// 解压后总大小上限（字节）
    #[serde(default = "default_max_total_size")]
    pub max_total_size: u64,
}

fn default_max_entries() -> usize {
    10_000
}

fn default_max_entry_size() -> u64 {
    64 * 1024 * 1024 // 64 MB
}

fn default_max_total_size() -> u64 {
    256 * 1024 * 1024 // 256 MB
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_entry_size: default_max_entry_size(),
            max_total_size: default_max_total_size(),
        }
    }
}

/// 函数运行时配置
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// 单次调用超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 最大并发调用数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// WASM 模块中被调用的导出函数名
    #[serde(default = "default_wasm_export")]
    pub wasm_export: String,

    /// WASM epoch 计时粒度（毫秒）
    #[serde(default = "default_epoch_tick_ms")]
    pub epoch_tick_ms: u64,

    /// 处理器 stdout 上限（字节）
    #[serde(default = "default_max_output_size")]
    pub max_output_size: usize,

    /// WASM 线性内存上限（字节）
    #[serde(default = "default_wasm_max_memory")]
    pub wasm_max_memory: usize,

    /// JavaScript 解释器
    #[serde(default = "default_node")]
    pub node: String,

    /// Python 解释器
    #[serde(default = "default_python")]
    pub python: String,

    /// Ruby 解释器
    #[serde(default = "default_ruby")]
    pub ruby: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    8
}

fn default_wasm_export() -> String {
    "handler".to_string()
}

fn default_epoch_tick_ms() -> u64 {
    10
}

fn default_max_output_size() -> usize {
    10 * 1024 * 1024
}

fn default_wasm_max_memory() -> usize {
    256 * 1024 * 1024
}

fn default_node() -> String {
    "node".to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_ruby() -> String {
    "ruby".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            wasm_export: default_wasm_export(),
            epoch_tick_ms: default_epoch_tick_ms(),
            max_output_size: default_max_output_size(),
            wasm_max_memory: default_wasm_max_memory(),
            node: default_node(),
            python: default_python(),
            ruby: default_ruby(),
        }
    }
}

impl RuntimeConfig {
    /// 获取脚本语言对应的解释器命令，WASM 不经过解释器
    pub fn interpreter(&self, language: Language) -> Option<&str> {
        match language {
            Language::JavaScript => Some(&self.node),
            Language::Python => Some(&self.python),
            Language::Ruby => Some(&self.ruby),
            Language::Wasm => None,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
