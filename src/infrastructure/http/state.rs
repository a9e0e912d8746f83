//! Application State
//!
//! 持有所有端口实例，并由此构建 Command/Query Handlers

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{
    // Command handlers
    DeleteBundleHandler, InvokeFunctionHandler, PurgeBundlesHandler, UploadBundleHandler,
    // Query handlers
    ExportBundleHandler, GetBundleHandler, ListBundlesHandler,
    // Ports
    BundleArchivePort, BundleRegistryPort, FunctionRuntimePort,
};

/// 应用状态
///
/// 端口实例只用于构建 handler，不单独保存
pub struct AppState {
    // ========== Command Handlers ==========
    pub upload_bundle_handler: UploadBundleHandler,
    pub delete_bundle_handler: DeleteBundleHandler,
    pub purge_bundles_handler: PurgeBundlesHandler,
    pub invoke_function_handler: InvokeFunctionHandler,

    // ========== Query Handlers ==========
    pub get_bundle_handler: GetBundleHandler,
    pub list_bundles_handler: ListBundlesHandler,
    pub export_bundle_handler: ExportBundleHandler,
}

impl AppState {
    /// 创建应用状态
    ///
    /// `work_dir` 为上传 bundle 的临时目录根
    pub fn new(
        registry: Arc<dyn BundleRegistryPort>,
        archive: Arc<dyn BundleArchivePort>,
        runtime: Arc<dyn FunctionRuntimePort>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            // Command handlers
            upload_bundle_handler: UploadBundleHandler::new(
                registry.clone(),
                archive.clone(),
                runtime.clone(),
                work_dir,
            ),
            delete_bundle_handler: DeleteBundleHandler::new(registry.clone(), runtime.clone()),
            purge_bundles_handler: PurgeBundlesHandler::new(registry.clone(), runtime.clone()),
            invoke_function_handler: InvokeFunctionHandler::new(registry.clone(), runtime),

            // Query handlers
            get_bundle_handler: GetBundleHandler::new(registry.clone()),
            list_bundles_handler: ListBundlesHandler::new(registry.clone()),
            export_bundle_handler: ExportBundleHandler::new(registry, archive),
        }
    }
}
