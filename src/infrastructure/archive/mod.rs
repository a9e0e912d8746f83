//! Archive Adapter - ZIP bundle 解压与打包

mod security;
mod zip_archive;

pub use security::PathValidator;
pub use zip_archive::ZipBundleArchive;
