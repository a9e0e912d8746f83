//! Function HTTP Handlers
//!
//! 上传、调用、查询、导出、删除 handler

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{
    DeleteBundle, ExportBundle, GetBundle, InvokeFunction, ListBundles, UploadBundle,
};
use crate::infrastructure::http::dto::{BundleResponse, StatusResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 调用 ID 响应头
pub const INVOCATION_ID_HEADER: &str = "x-invocation-id";

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e.body_text()))
    }
}

/// 上传 handler bundle（multipart，取第一个文件字段）
pub async fn upload_function(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut file_name: Option<String> = None;
    let mut data: Vec<u8> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(field_file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        file_name = Some(field_file_name);
        data = field.bytes().await.map_err(multipart_error)?.to_vec();
        break;
    }

    let result = state
        .upload_bundle_handler
        .handle(UploadBundle {
            name,
            file_name,
            data,
        })
        .await?;

    Ok(Json(StatusResponse::ok(format!(
        "Handler {} uploaded",
        result.name
    ))))
}

/// 调用 handler，请求体原样作为 stdin
pub async fn invoke_function(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let result = state
        .invoke_function_handler
        .handle(InvokeFunction {
            name,
            input: body.to_vec(),
        })
        .await?;

    let mut response = (
        [(header::CONTENT_TYPE, "application/json")],
        result.output,
    )
        .into_response();

    if let Ok(value) = HeaderValue::from_str(&result.invocation_id.to_string()) {
        response.headers_mut().insert(INVOCATION_ID_HEADER, value);
    }

    Ok(response)
}

/// 列出所有 handler
pub async fn list_functions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BundleResponse>>, ApiError> {
    let result = state.list_bundles_handler.handle(ListBundles).await?;

    Ok(Json(result.into_iter().map(BundleResponse::from).collect()))
}

/// 获取 handler 元数据
pub async fn get_function_metadata(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<BundleResponse>, ApiError> {
    let result = state.get_bundle_handler.handle(GetBundle { name }).await?;

    Ok(Json(BundleResponse::from(result)))
}

/// 下载 handler bundle（重新打包的 ZIP）
pub async fn export_function_bundle(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let result = state
        .export_bundle_handler
        .handle(ExportBundle { name })
        .await?;

    let file = tokio::fs::File::from_std(result.archive.file);
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_LENGTH, result.archive.size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.zip\"", result.name),
        )
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// 删除 handler
pub async fn delete_function(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .delete_bundle_handler
        .handle(DeleteBundle { name: name.clone() })
        .await?;

    Ok(Json(StatusResponse::ok(format!("Handler {} deleted", name))))
}
