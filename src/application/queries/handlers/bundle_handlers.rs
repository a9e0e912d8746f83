//! Bundle Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{BundleArchivePort, BundleRegistryPort, PackedArchive};
use crate::application::queries::{ExportBundle, GetBundle, ListBundles};
use crate::domain::function::{FunctionBundle, FunctionName, Language};

// ============================================================================
// Response DTOs
// ============================================================================

/// bundle 摘要
#[derive(Debug, Clone)]
pub struct BundleSummary {
    pub name: String,
    pub language: Language,
    pub entrypoint: String,
    pub description: Option<String>,
    pub file_count: usize,
    pub archive_size: u64,
    pub uploaded_at: String,
}

impl From<&FunctionBundle> for BundleSummary {
    fn from(bundle: &FunctionBundle) -> Self {
        Self {
            name: bundle.name().to_string(),
            language: bundle.language(),
            entrypoint: bundle.metadata().entrypoint_file.clone(),
            description: bundle.metadata().description.clone(),
            file_count: bundle.file_count(),
            archive_size: bundle.archive_size(),
            uploaded_at: bundle.uploaded_at().to_rfc3339(),
        }
    }
}

/// 导出结果
#[derive(Debug)]
pub struct ExportBundleResponse {
    pub name: String,
    pub archive: PackedArchive,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetBundle Handler
pub struct GetBundleHandler {
    registry: Arc<dyn BundleRegistryPort>,
}

impl GetBundleHandler {
    pub fn new(registry: Arc<dyn BundleRegistryPort>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, query: GetBundle) -> Result<BundleSummary, ApplicationError> {
        let name = FunctionName::new(query.name)?;
        let bundle = self
            .registry
            .get(&name)
            .ok_or_else(|| ApplicationError::not_found("Handler", name.as_str()))?;

        Ok(BundleSummary::from(bundle.as_ref()))
    }
}

/// ListBundles Handler
pub struct ListBundlesHandler {
    registry: Arc<dyn BundleRegistryPort>,
}

impl ListBundlesHandler {
    pub fn new(registry: Arc<dyn BundleRegistryPort>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, _query: ListBundles) -> Result<Vec<BundleSummary>, ApplicationError> {
        Ok(self
            .registry
            .list()
            .iter()
            .map(|bundle| BundleSummary::from(bundle.as_ref()))
            .collect())
    }
}

/// ExportBundle Handler
///
/// 将已解压的 bundle 目录重新打包为 ZIP
pub struct ExportBundleHandler {
    registry: Arc<dyn BundleRegistryPort>,
    archive: Arc<dyn BundleArchivePort>,
}

impl ExportBundleHandler {
    pub fn new(registry: Arc<dyn BundleRegistryPort>, archive: Arc<dyn BundleArchivePort>) -> Self {
        Self { registry, archive }
    }

    pub async fn handle(&self, query: ExportBundle) -> Result<ExportBundleResponse, ApplicationError> {
        let name = FunctionName::new(query.name)?;
        let bundle = self
            .registry
            .get(&name)
            .ok_or_else(|| ApplicationError::not_found("Handler", name.as_str()))?;

        let archive = self.archive.pack(bundle.directory()).await?;

        tracing::info!(name = %name, size = archive.size, "Bundle exported");

        Ok(ExportBundleResponse {
            name: name.to_string(),
            archive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use crate::application::commands::handlers::UploadBundleHandler;
    use crate::application::commands::UploadBundle;
    use crate::infrastructure::archive::ZipBundleArchive;
    use crate::infrastructure::memory::InMemoryBundleRegistry;
    use crate::infrastructure::runtime::{ScriptRuntime, ScriptRuntimeConfig};
    use crate::test_support::build_zip;

    async fn setup(temp: &tempfile::TempDir) -> (Arc<InMemoryBundleRegistry>, Arc<ZipBundleArchive>) {
        let registry = Arc::new(InMemoryBundleRegistry::new());
        let archive = Arc::new(ZipBundleArchive::default());
        let upload = UploadBundleHandler::new(
            registry.clone(),
            archive.clone(),
            Arc::new(ScriptRuntime::new(ScriptRuntimeConfig::default())),
            temp.path().to_path_buf(),
        );

        for name in ["beta", "alpha"] {
            let data = build_zip(&[
                (
                    "metadata.json",
                    br#"{"language":"ruby","entrypointFile":"lib/main.rb","description":"demo"}"#
                        .as_slice(),
                ),
                ("lib/main.rb", b"puts '{}'".as_slice()),
            ]);
            upload
                .handle(UploadBundle {
                    name: name.to_string(),
                    file_name: Some("bundle.zip".to_string()),
                    data,
                })
                .await
                .unwrap();
        }

        (registry, archive)
    }

    #[tokio::test]
    async fn test_get_and_list() {
        let temp = tempfile::tempdir().unwrap();
        let (registry, _) = setup(&temp).await;

        let summary = GetBundleHandler::new(registry.clone())
            .handle(GetBundle { name: "alpha".to_string() })
            .await
            .unwrap();
        assert_eq!(summary.language, Language::Ruby);
        assert_eq!(summary.entrypoint, "lib/main.rb");
        assert_eq!(summary.description.as_deref(), Some("demo"));
        assert_eq!(summary.file_count, 2);

        let names: Vec<String> = ListBundlesHandler::new(registry)
            .handle(ListBundles)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_get_unknown_bundle() {
        let registry = Arc::new(InMemoryBundleRegistry::new());
        let err = GetBundleHandler::new(registry)
            .handle(GetBundle { name: "nope".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_export_contains_bundle_files() {
        let temp = tempfile::tempdir().unwrap();
        let (registry, archive) = setup(&temp).await;

        let response = ExportBundleHandler::new(registry, archive)
            .handle(ExportBundle { name: "beta".to_string() })
            .await
            .unwrap();
        assert!(response.archive.size > 0);

        let mut zip = zip::ZipArchive::new(response.archive.file).unwrap();
        let mut content = String::new();
        zip.by_name("lib/main.rb")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "puts '{}'");
        assert!(zip.by_name("metadata.json").is_ok());
    }
}
