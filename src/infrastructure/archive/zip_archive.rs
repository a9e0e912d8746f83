//! ZIP Bundle Archive - 基于 zip crate 的 BundleArchivePort 实现
//!
//! 解压时逐条目校验路径和大小限额，打包时按文件名排序输出，保证结果稳定

use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::security::PathValidator;
use crate::application::ports::{
    ArchiveError, ArchiveQuotas, BundleArchivePort, ExtractSummary, PackedArchive,
};

/// ZIP 归档适配器
#[derive(Debug, Clone, Default)]
pub struct ZipBundleArchive {
    quotas: ArchiveQuotas,
}

impl ZipBundleArchive {
    pub fn new(quotas: ArchiveQuotas) -> Self {
        Self { quotas }
    }

    /// 同步解压（在 blocking 线程中执行）
    pub fn extract_sync(
        data: Vec<u8>,
        dest: &Path,
        quotas: &ArchiveQuotas,
    ) -> Result<ExtractSummary, ArchiveError> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;

        if archive.len() > quotas.max_entries {
            return Err(ArchiveError::QuotaExceeded(format!(
                "Archive contains {} entries, exceeds limit of {}",
                archive.len(),
                quotas.max_entries
            )));
        }

        fs::create_dir_all(dest)?;

        let mut summary = ExtractSummary::default();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let raw_name = entry.name().to_string();

            PathValidator::validate(&raw_name)?;
            let relative = entry
                .enclosed_name()
                .map(Path::to_path_buf)
                .ok_or_else(|| ArchiveError::UnsafePath(raw_name.clone()))?;
            let target = dest.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }

            // 先用声明大小快速拒绝，再按实际写出字节数累计
            Self::validate_entry_size(entry.size(), quotas, &raw_name)?;

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut out = File::create(&target)?;
            let written = io::copy(&mut (&mut entry).take(quotas.max_entry_size + 1), &mut out)?;
            Self::validate_entry_size(written, quotas, &raw_name)?;
            Self::validate_total_size(written, &mut summary.total_size, quotas)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                // 保证属主可读写，其余权限沿用归档中的设置
                if let Some(mode) = entry.unix_mode() {
                    let mode = (mode & 0o777) | 0o600;
                    fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
                }
            }

            summary.file_count += 1;
        }

        tracing::debug!(
            dest = %dest.display(),
            files = summary.file_count,
            size = summary.total_size,
            "Archive extracted"
        );

        Ok(summary)
    }

    /// 同步打包到匿名临时文件
    pub fn pack_sync(source_dir: &Path) -> Result<PackedArchive, ArchiveError> {
        if !source_dir.is_dir() {
            return Err(ArchiveError::IoError(format!(
                "Not a directory: {}",
                source_dir.display()
            )));
        }

        let mut zip = ZipWriter::new(tempfile::tempfile()?);
        Self::add_directory(&mut zip, source_dir, "")?;

        let mut file = zip.finish()?;
        let size = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        Ok(PackedArchive { file, size })
    }

    fn add_directory<W: Write + Seek>(
        zip: &mut ZipWriter<W>,
        dir: &Path,
        prefix: &str,
    ) -> Result<(), ArchiveError> {
        let mut entries: Vec<(String, PathBuf)> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| (e.file_name().to_string_lossy().to_string(), e.path())))
            .collect::<Result<_, _>>()?;
        entries.sort();

        for (file_name, path) in entries {
            let name = format!("{}{}", prefix, file_name);
            let metadata = fs::symlink_metadata(&path)?;

            if metadata.is_dir() {
                zip.add_directory(format!("{}/", name), Self::file_options(&metadata))?;
                Self::add_directory(zip, &path, &format!("{}/", name))?;
            } else if metadata.is_file() {
                zip.start_file(name, Self::file_options(&metadata))?;
                io::copy(&mut File::open(&path)?, zip)?;
            } else {
                tracing::debug!(path = %path.display(), "Skipping non-regular file");
            }
        }

        Ok(())
    }

    fn file_options(_metadata: &fs::Metadata) -> FileOptions {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        #[cfg(unix)]
        let options = {
            use std::os::unix::fs::PermissionsExt;
            options.unix_permissions(_metadata.permissions().mode() & 0o777)
        };

        options
    }

    fn validate_entry_size(
        size: u64,
        quotas: &ArchiveQuotas,
        entry_path: &str,
    ) -> Result<(), ArchiveError> {
        if size > quotas.max_entry_size {
            return Err(ArchiveError::QuotaExceeded(format!(
                "Entry {} size {} exceeds limit {}",
                entry_path, size, quotas.max_entry_size
            )));
        }
        Ok(())
    }

    fn validate_total_size(
        size: u64,
        total: &mut u64,
        quotas: &ArchiveQuotas,
    ) -> Result<(), ArchiveError> {
        *total = total.saturating_add(size);
        if *total > quotas.max_total_size {
            return Err(ArchiveError::QuotaExceeded(format!(
                "Total uncompressed size {} exceeds limit {}",
                *total, quotas.max_total_size
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BundleArchivePort for ZipBundleArchive {
    async fn extract(&self, data: Vec<u8>, dest: &Path) -> Result<ExtractSummary, ArchiveError> {
        let dest = dest.to_path_buf();
        let quotas = self.quotas.clone();

        tokio::task::spawn_blocking(move || Self::extract_sync(data, &dest, &quotas))
            .await
            .map_err(|e| ArchiveError::IoError(format!("Extract task failed: {}", e)))?
    }

    async fn pack(&self, source_dir: &Path) -> Result<PackedArchive, ArchiveError> {
        let source_dir = source_dir.to_path_buf();

        tokio::task::spawn_blocking(move || Self::pack_sync(&source_dir))
            .await
            .map_err(|e| ArchiveError::IoError(format!("Pack task failed: {}", e)))?
    }
}
