//! polyfaas - 多语言函数运行时
//!
//! 启动顺序: 配置 -> 日志 -> 适配器 -> AppState -> HTTP 服务器

use std::sync::Arc;

use polyfaas::application::{ArchiveQuotas, PurgeBundles};
use polyfaas::config::{load_config, print_config, AppConfig};
use polyfaas::infrastructure::http::{AppState, HttpServer, ServerConfig};
use polyfaas::infrastructure::{InMemoryBundleRegistry, PolyglotRuntime, ZipBundleArchive};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},polyfaas={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("polyfaas v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    tokio::fs::create_dir_all(&config.storage.work_dir).await?;

    // 适配器
    let registry = Arc::new(InMemoryBundleRegistry::new());
    let archive = Arc::new(ZipBundleArchive::new(ArchiveQuotas {
        max_entries: config.archive.max_entries,
        max_entry_size: config.archive.max_entry_size,
        max_total_size: config.archive.max_total_size,
    }));
    let runtime = Arc::new(PolyglotRuntime::from_config(&config.runtime)?);

    // WASM 超时依赖 epoch 计时
    let ticker = runtime.spawn_epoch_ticker();

    let state = Arc::new(AppState::new(
        registry,
        archive,
        runtime,
        config.storage.work_dir.clone(),
    ));

    let server = HttpServer::new(ServerConfig::from(&config.server), state.clone());

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    ticker.abort();

    if config.storage.cleanup_on_shutdown {
        let removed = state.purge_bundles_handler.handle(PurgeBundles).await;
        tracing::info!(removed, "Bundle directories cleaned up");
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
