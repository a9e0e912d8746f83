//! Bundle Command Handlers
//!
//! 被替换或删除的 bundle 只从注册表中移除；工作目录由 `WorkDir`
//! 在最后一个引用（包括进行中的调用）释放后删除

use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use crate::application::commands::{DeleteBundle, PurgeBundles, UploadBundle};
use crate::application::error::ApplicationError;
use crate::application::ports::{BundleArchivePort, BundleRegistryPort, FunctionRuntimePort};
use crate::domain::function::{FunctionBundle, FunctionMetadata, FunctionName, Language, WorkDir};

/// 每次上传的临时工作目录前缀
pub const SCRATCH_DIR_PREFIX: &str = "polyglot-faas-";

// ============================================================================
// UploadBundle
// ============================================================================

/// 上传 bundle 响应
#[derive(Debug, Clone)]
pub struct UploadBundleResponse {
    pub name: String,
    pub language: Language,
    pub file_count: usize,
    /// 是否替换了同名 bundle
    pub replaced: bool,
}

/// UploadBundle Handler
///
/// 解压到 `<work_dir>/polyglot-faas-XXXX/<name>`，读取 metadata.json 后注册
pub struct UploadBundleHandler {
    registry: Arc<dyn BundleRegistryPort>,
    archive: Arc<dyn BundleArchivePort>,
    runtime: Arc<dyn FunctionRuntimePort>,
    work_dir: PathBuf,
}

impl UploadBundleHandler {
    pub fn new(
        registry: Arc<dyn BundleRegistryPort>,
        archive: Arc<dyn BundleArchivePort>,
        runtime: Arc<dyn FunctionRuntimePort>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            registry,
            archive,
            runtime,
            work_dir,
        }
    }

    pub async fn handle(
        &self,
        command: UploadBundle,
    ) -> Result<UploadBundleResponse, ApplicationError> {
        let name = FunctionName::new(command.name)?;

        if command.data.is_empty() {
            return Err(ApplicationError::validation("No file uploaded"));
        }

        // 扩展名区分大小写
        let is_zip = command
            .file_name
            .as_deref()
            .map(|f| f.ends_with(".zip"))
            .unwrap_or(false);
        if !is_zip {
            return Err(ApplicationError::validation("File is not a zip file"));
        }

        fs::create_dir_all(&self.work_dir).await.map_err(|e| {
            ApplicationError::storage(format!("Failed to create work directory: {}", e))
        })?;

        // 注册成功前出错时 TempDir 被 drop，目录随之删除
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_DIR_PREFIX)
            .tempdir_in(&self.work_dir)
            .map_err(|e| {
                ApplicationError::storage(format!("Failed to create scratch directory: {}", e))
            })?;

        let out_dir = scratch.path().join(name.as_str());
        let archive_size = command.data.len() as u64;
        let summary = self.archive.extract(command.data, &out_dir).await?;

        let metadata_path = out_dir.join(FunctionMetadata::FILE_NAME);
        let raw = match fs::read(&metadata_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApplicationError::validation(format!(
                    "{} not found in bundle",
                    FunctionMetadata::FILE_NAME
                )));
            }
            Err(e) => {
                return Err(ApplicationError::storage(format!(
                    "Failed to read {}: {}",
                    FunctionMetadata::FILE_NAME,
                    e
                )));
            }
        };
        let metadata = FunctionMetadata::from_json(&raw)?;

        // 之后目录归 bundle 所有，创建失败时由 WorkDir 清理
        let bundle = FunctionBundle::new(
            name.clone(),
            metadata,
            WorkDir::owned(scratch.keep()),
            archive_size,
            summary.file_count,
        )?;
        let language = bundle.language();

        let replaced = self.registry.insert(bundle).is_some();
        if replaced {
            self.runtime.evict(&name);
        }

        tracing::info!(
            name = %name,
            language = %language,
            files = summary.file_count,
            size = summary.total_size,
            replaced,
            "Bundle uploaded"
        );

        Ok(UploadBundleResponse {
            name: name.to_string(),
            language,
            file_count: summary.file_count,
            replaced,
        })
    }
}

// ============================================================================
// DeleteBundle
// ============================================================================

/// DeleteBundle Handler
pub struct DeleteBundleHandler {
    registry: Arc<dyn BundleRegistryPort>,
    runtime: Arc<dyn FunctionRuntimePort>,
}

impl DeleteBundleHandler {
    pub fn new(
        registry: Arc<dyn BundleRegistryPort>,
        runtime: Arc<dyn FunctionRuntimePort>,
    ) -> Self {
        Self { registry, runtime }
    }

    pub async fn handle(&self, command: DeleteBundle) -> Result<(), ApplicationError> {
        let name = FunctionName::new(command.name)?;

        self.registry
            .remove(&name)
            .ok_or_else(|| ApplicationError::not_found("Handler", name.as_str()))?;
        self.runtime.evict(&name);

        tracing::info!(name = %name, "Bundle deleted");

        Ok(())
    }
}

// ============================================================================
// PurgeBundles
// ============================================================================

/// PurgeBundles Handler（关闭时清理全部 bundle）
pub struct PurgeBundlesHandler {
    registry: Arc<dyn BundleRegistryPort>,
    runtime: Arc<dyn FunctionRuntimePort>,
}

impl PurgeBundlesHandler {
    pub fn new(
        registry: Arc<dyn BundleRegistryPort>,
        runtime: Arc<dyn FunctionRuntimePort>,
    ) -> Self {
        Self { registry, runtime }
    }

    /// 返回注销的 bundle 数量
    pub async fn handle(&self, _command: PurgeBundles) -> usize {
        let names: Vec<FunctionName> = self
            .registry
            .list()
            .iter()
            .map(|bundle| bundle.name().clone())
            .collect();

        let mut purged = 0;
        for name in names {
            if self.registry.remove(&name).is_some() {
                self.runtime.evict(&name);
                purged += 1;
            }
        }

        tracing::info!(purged, "Bundles purged");
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::application::ports::{InvocationOutput, RuntimeError};
    use crate::infrastructure::archive::ZipBundleArchive;
    use crate::infrastructure::memory::InMemoryBundleRegistry;
    use crate::test_support::build_zip;

    /// 记录 evict 调用的运行时
    #[derive(Default)]
    struct RecordingRuntime {
        evicted: Mutex<Vec<String>>,
    }

    impl RecordingRuntime {
        fn evicted(&self) -> Vec<String> {
            self.evicted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FunctionRuntimePort for RecordingRuntime {
        fn supports(&self, _language: Language) -> bool {
            true
        }

        async fn invoke(
            &self,
            _bundle: &FunctionBundle,
            input: Vec<u8>,
        ) -> Result<InvocationOutput, RuntimeError> {
            Ok(InvocationOutput {
                stdout: input,
                duration_ms: 0,
            })
        }

        fn evict(&self, name: &FunctionName) {
            self.evicted.lock().unwrap().push(name.to_string());
        }
    }

    struct Fixture {
        temp: tempfile::TempDir,
        registry: Arc<InMemoryBundleRegistry>,
        runtime: Arc<RecordingRuntime>,
        upload: UploadBundleHandler,
        delete: DeleteBundleHandler,
        purge: PurgeBundlesHandler,
    }

    fn fixture() -> Fixture {
        let temp = tempfile::tempdir().unwrap();
        let registry = Arc::new(InMemoryBundleRegistry::new());
        let archive = Arc::new(ZipBundleArchive::default());
        let runtime = Arc::new(RecordingRuntime::default());
        Fixture {
            upload: UploadBundleHandler::new(
                registry.clone(),
                archive,
                runtime.clone(),
                temp.path().to_path_buf(),
            ),
            delete: DeleteBundleHandler::new(registry.clone(), runtime.clone()),
            purge: PurgeBundlesHandler::new(registry.clone(), runtime.clone()),
            registry,
            runtime,
            temp,
        }
    }

    fn js_bundle() -> Vec<u8> {
        build_zip(&[
            (
                "metadata.json",
                br#"{"language":"js","entrypointFile":"index.js"}"#.as_slice(),
            ),
            ("index.js", b"console.log('{}')".as_slice()),
        ])
    }

    fn upload_command(name: &str, data: Vec<u8>) -> UploadBundle {
        UploadBundle {
            name: name.to_string(),
            file_name: Some(format!("{}.zip", name)),
            data,
        }
    }

    fn work_dir_of(registry: &InMemoryBundleRegistry, name: &str) -> PathBuf {
        registry
            .get(&FunctionName::new(name).unwrap())
            .unwrap()
            .work_dir()
            .to_path_buf()
    }

    #[tokio::test]
    async fn test_upload_registers_bundle() {
        let f = fixture();

        let response = f.upload.handle(upload_command("hello", js_bundle())).await.unwrap();
        assert_eq!(response.name, "hello");
        assert_eq!(response.language, Language::JavaScript);
        assert_eq!(response.file_count, 2);
        assert!(!response.replaced);

        let bundle = f.registry.get(&FunctionName::new("hello").unwrap()).unwrap();
        assert!(bundle.entrypoint_path().is_file());
        assert!(bundle
            .work_dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_DIR_PREFIX));
        assert!(bundle.directory().ends_with("hello"));
        assert!(f.runtime.evicted().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_non_zip_name() {
        let f = fixture();

        for file_name in ["bundle.tar.gz", "BUNDLE.ZIP"] {
            let mut command = upload_command("hello", js_bundle());
            command.file_name = Some(file_name.to_string());

            let err = f.upload.handle(command).await.unwrap_err();
            assert_eq!(err.to_string(), "Validation error: File is not a zip file");
        }
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file() {
        let f = fixture();
        let err = f.upload.handle(upload_command("hello", Vec::new())).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: No file uploaded");
    }

    #[tokio::test]
    async fn test_upload_without_metadata_cleans_up() {
        let f = fixture();
        let data = build_zip(&[("index.js", b"".as_slice())]);

        let err = f.upload.handle(upload_command("hello", data)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert!(f.registry.is_empty());

        // 失败的上传不留下临时目录
        let leftovers = std::fs::read_dir(f.temp.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_upload_with_missing_entrypoint_fails() {
        let f = fixture();
        let data = build_zip(&[(
            "metadata.json",
            br#"{"language":"python","entrypointFile":"main.py"}"#.as_slice(),
        )]);

        let err = f.upload.handle(upload_command("hello", data)).await.unwrap_err();
        assert!(err.to_string().contains("main.py"));
        assert_eq!(std::fs::read_dir(f.temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_reupload_replaces_and_removes_old_directory() {
        let f = fixture();
        f.upload.handle(upload_command("hello", js_bundle())).await.unwrap();
        let first_dir = work_dir_of(&f.registry, "hello");

        let response = f.upload.handle(upload_command("hello", js_bundle())).await.unwrap();
        assert!(response.replaced);
        assert!(!first_dir.exists());
        assert!(work_dir_of(&f.registry, "hello").exists());
        assert_eq!(f.registry.len(), 1);
        assert_eq!(f.runtime.evicted(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_replaced_bundle_kept_while_referenced() {
        let f = fixture();
        f.upload.handle(upload_command("hello", js_bundle())).await.unwrap();
        let held = f.registry.get(&FunctionName::new("hello").unwrap()).unwrap();

        f.upload.handle(upload_command("hello", js_bundle())).await.unwrap();
        assert!(held.entrypoint_path().is_file());

        let old_dir = held.work_dir().to_path_buf();
        drop(held);
        assert!(!old_dir.exists());
    }

    #[tokio::test]
    async fn test_delete_bundle() {
        let f = fixture();
        f.upload.handle(upload_command("hello", js_bundle())).await.unwrap();
        let dir = work_dir_of(&f.registry, "hello");

        f.delete
            .handle(DeleteBundle { name: "hello".to_string() })
            .await
            .unwrap();
        assert!(f.registry.is_empty());
        assert!(!dir.exists());
        assert_eq!(f.runtime.evicted(), vec!["hello"]);

        let err = f
            .delete
            .handle(DeleteBundle { name: "hello".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_purge_bundles() {
        let f = fixture();
        f.upload.handle(upload_command("a", js_bundle())).await.unwrap();
        f.upload.handle(upload_command("b", js_bundle())).await.unwrap();

        assert_eq!(f.purge.handle(PurgeBundles).await, 2);
        assert!(f.registry.is_empty());
        assert_eq!(std::fs::read_dir(f.temp.path()).unwrap().count(), 0);
        assert_eq!(f.runtime.evicted(), vec!["a", "b"]);
    }

    #[cfg(unix)]
    mod in_flight {
        use super::*;
        use std::collections::HashMap;
        use std::time::Duration;

        use crate::application::commands::handlers::InvokeFunctionHandler;
        use crate::application::commands::InvokeFunction;
        use crate::infrastructure::runtime::{ScriptRuntime, ScriptRuntimeConfig};

        struct Service {
            _temp: tempfile::TempDir,
            registry: Arc<InMemoryBundleRegistry>,
            upload: UploadBundleHandler,
            delete: DeleteBundleHandler,
            invoke: Arc<InvokeFunctionHandler>,
        }

        /// `sh` 充当 python 解释器
        fn service() -> Service {
            let temp = tempfile::tempdir().unwrap();
            let registry = Arc::new(InMemoryBundleRegistry::new());
            let runtime = Arc::new(ScriptRuntime::new(ScriptRuntimeConfig {
                interpreters: HashMap::from([(Language::Python, "sh".to_string())]),
                timeout: Duration::from_secs(5),
                ..Default::default()
            }));

            Service {
                upload: UploadBundleHandler::new(
                    registry.clone(),
                    Arc::new(ZipBundleArchive::default()),
                    runtime.clone(),
                    temp.path().to_path_buf(),
                ),
                delete: DeleteBundleHandler::new(registry.clone(), runtime.clone()),
                invoke: Arc::new(InvokeFunctionHandler::new(registry.clone(), runtime)),
                registry,
                _temp: temp,
            }
        }

        /// 先 sleep，再读取 bundle 内的数据文件
        fn slow_bundle(data: &str) -> Vec<u8> {
            build_zip(&[
                (
                    "metadata.json",
                    br#"{"language":"python","entrypointFile":"main.py"}"#.as_slice(),
                ),
                ("main.py", b"sleep 0.5; cat data.txt".as_slice()),
                ("data.txt", data.as_bytes()),
            ])
        }

        fn spawn_invocation(
            invoke: &Arc<InvokeFunctionHandler>,
        ) -> tokio::task::JoinHandle<Result<Vec<u8>, ApplicationError>> {
            let invoke = invoke.clone();
            tokio::spawn(async move {
                invoke
                    .handle(InvokeFunction {
                        name: "slow".to_string(),
                        input: Vec::new(),
                    })
                    .await
                    .map(|response| response.output)
            })
        }

        #[tokio::test]
        async fn test_reupload_during_invocation() {
            let s = service();
            s.upload.handle(upload_command("slow", slow_bundle("v1"))).await.unwrap();
            let old_dir = work_dir_of(&s.registry, "slow");

            let running = spawn_invocation(&s.invoke);
            tokio::time::sleep(Duration::from_millis(150)).await;

            let response = s.upload.handle(upload_command("slow", slow_bundle("v2"))).await.unwrap();
            assert!(response.replaced);
            assert!(old_dir.exists());

            assert_eq!(running.await.unwrap().unwrap(), b"v1".to_vec());
            assert!(!old_dir.exists());

            let next = spawn_invocation(&s.invoke).await.unwrap().unwrap();
            assert_eq!(next, b"v2".to_vec());
        }

        #[tokio::test]
        async fn test_delete_during_invocation() {
            let s = service();
            s.upload.handle(upload_command("slow", slow_bundle("v1"))).await.unwrap();
            let dir = work_dir_of(&s.registry, "slow");

            let running = spawn_invocation(&s.invoke);
            tokio::time::sleep(Duration::from_millis(150)).await;

            s.delete
                .handle(DeleteBundle { name: "slow".to_string() })
                .await
                .unwrap();
            assert!(dir.exists());

            assert_eq!(running.await.unwrap().unwrap(), b"v1".to_vec());
            assert!(!dir.exists());

            let err = spawn_invocation(&s.invoke).await.unwrap().unwrap_err();
            assert!(matches!(err, ApplicationError::NotFound { .. }));
        }
    }
}
