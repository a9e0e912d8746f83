//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `POLYFAAS_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `POLYFAAS_SERVER__PORT=9000`
/// - `POLYFAAS_STORAGE__WORK_DIR=/var/lib/polyfaas`
/// - `POLYFAAS_RUNTIME__TIMEOUT_SECS=10`
/// - `POLYFAAS_RUNTIME__NODE=/usr/local/bin/node`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.max_upload_size", 50 * 1024 * 1024)?
        .set_default("server.openapi_enabled", true)?
        .set_default(
            "storage.work_dir",
            std::env::temp_dir().to_string_lossy().to_string(),
        )?
        .set_default("storage.cleanup_on_shutdown", true)?
        .set_default("archive.max_entries", 10_000)?
        .set_default("archive.max_entry_size", 64_u64 * 1024 * 1024)?
        .set_default("archive.max_total_size", 256_u64 * 1024 * 1024)?
        .set_default("runtime.timeout_secs", 30)?
        .set_default("runtime.max_concurrent", 8)?
        .set_default("runtime.wasm_export", "handler")?
        .set_default("runtime.epoch_tick_ms", 10)?
        .set_default("runtime.max_output_size", 10 * 1024 * 1024)?
        .set_default("runtime.wasm_max_memory", 256 * 1024 * 1024)?
        .set_default("runtime.node", "node")?
        .set_default("runtime.python", "python3")?
        .set_default("runtime.ruby", "ruby")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: POLYFAAS_RUNTIME__TIMEOUT_SECS=10
    builder = builder.add_source(
        Environment::with_prefix("POLYFAAS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.server.max_upload_size == 0 {
        return Err(ConfigError::ValidationError(
            "Max upload size cannot be 0".to_string(),
        ));
    }

    if config.archive.max_entries == 0
        || config.archive.max_entry_size == 0
        || config.archive.max_total_size == 0
    {
        return Err(ConfigError::ValidationError(
            "Archive quotas must be greater than 0".to_string(),
        ));
    }

    if config.runtime.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Runtime timeout cannot be 0".to_string(),
        ));
    }

    if config.runtime.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "Runtime max_concurrent cannot be 0".to_string(),
        ));
    }

    if config.runtime.epoch_tick_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Runtime epoch tick cannot be 0".to_string(),
        ));
    }

    if config.runtime.max_output_size == 0 || config.runtime.wasm_max_memory == 0 {
        return Err(ConfigError::ValidationError(
            "Runtime output and memory limits must be greater than 0".to_string(),
        ));
    }

    if config.runtime.wasm_export.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "WASM export name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Max Upload Size: {} bytes", config.server.max_upload_size);
    tracing::info!("OpenAPI Enabled: {}", config.server.openapi_enabled);
    tracing::info!("Work Directory: {:?}", config.storage.work_dir);
    tracing::info!(
        "Archive Quotas: entries={}, entry_size={}, total_size={}",
        config.archive.max_entries,
        config.archive.max_entry_size,
        config.archive.max_total_size
    );
    tracing::info!("Runtime Timeout: {}s", config.runtime.timeout_secs);
    tracing::info!("Runtime Max Concurrent: {}", config.runtime.max_concurrent);
    tracing::info!("WASM Export: {}", config.runtime.wasm_export);
    tracing::info!(
        "Runtime Limits: output={} bytes, wasm_memory={} bytes",
        config.runtime.max_output_size,
        config.runtime.wasm_max_memory
    );
    tracing::info!(
        "Interpreters: node={}, python={}, ruby={}",
        config.runtime.node,
        config.runtime.python,
        config.runtime.ruby
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_timeout() {
        let mut config = AppConfig::default();
        config.runtime.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_quota() {
        let mut config = AppConfig::default();
        config.archive.max_total_size = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_limits() {
        let mut config = AppConfig::default();
        config.runtime.max_output_size = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.runtime.wasm_max_memory = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_export() {
        let mut config = AppConfig::default();
        config.runtime.wasm_export = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9191\n\n[runtime]\ntimeout_secs = 5\npython = \"python3.12\""
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.runtime.timeout_secs, 5);
        assert_eq!(config.runtime.python, "python3.12");
        // 未覆盖的字段保持默认值
        assert_eq!(config.runtime.wasm_export, "handler");
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
