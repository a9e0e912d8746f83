//! Data Transfer Objects

use serde::Serialize;

use crate::application::BundleSummary;

/// 操作结果: `{"status":"ok","message":"..."}`
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok",
            message: message.into(),
        }
    }
}

/// Handler 摘要
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResponse {
    pub name: String,
    pub language: String,
    pub entrypoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub file_count: usize,
    pub archive_size: u64,
    pub uploaded_at: String,
}

impl From<BundleSummary> for BundleResponse {
    fn from(summary: BundleSummary) -> Self {
        Self {
            name: summary.name,
            language: summary.language.identifier().to_string(),
            entrypoint: summary.entrypoint,
            description: summary.description,
            file_count: summary.file_count,
            archive_size: summary.archive_size,
            uploaded_at: summary.uploaded_at,
        }
    }
}
