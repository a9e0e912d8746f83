//! Function Context - Aggregate Root

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use super::{FunctionError, FunctionMetadata, FunctionName, Language, WorkDir};

/// FunctionBundle 聚合根
///
/// 不变量:
/// - directory == work_dir/name
/// - 入口文件在注册时已存在于 directory 之内
/// - 不可 Clone：工作目录的生命周期跟随 bundle
#[derive(Debug)]
pub struct FunctionBundle {
    name: FunctionName,
    metadata: FunctionMetadata,
    work_dir: WorkDir,
    directory: PathBuf,
    archive_size: u64,
    file_count: usize,
    uploaded_at: DateTime<Utc>,
}

impl FunctionBundle {
    /// 基于已解压的目录创建 bundle，校验入口文件存在
    pub fn new(
        name: FunctionName,
        metadata: FunctionMetadata,
        work_dir: impl Into<WorkDir>,
        archive_size: u64,
        file_count: usize,
    ) -> Result<Self, FunctionError> {
        let work_dir = work_dir.into();
        let directory = work_dir.path().join(name.as_str());
        let bundle = Self {
            name,
            metadata,
            work_dir,
            directory,
            archive_size,
            file_count,
            uploaded_at: Utc::now(),
        };

        let entrypoint = bundle.entrypoint_path();
        if !entrypoint.is_file() {
            return Err(FunctionError::EntrypointNotFound(
                bundle.metadata.entrypoint_file.clone(),
            ));
        }

        Ok(bundle)
    }

    /// 入口文件绝对路径
    pub fn entrypoint_path(&self) -> PathBuf {
        self.directory.join(self.metadata.entrypoint_relative())
    }

    // Getters
    pub fn name(&self) -> &FunctionName {
        &self.name
    }

    pub fn metadata(&self) -> &FunctionMetadata {
        &self.metadata
    }

    pub fn language(&self) -> Language {
        self.metadata.language
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn archive_size(&self) -> u64 {
        self.archive_size
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }
}
