//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                         GET     健康检查
//! - /api/v1/handler                   GET     列出所有 handler
//! - /api/v1/handler/:name             POST    上传 bundle（multipart）
//! - /api/v1/handler/:name             GET     调用 handler（请求体为输入）
//! - /api/v1/handler/:name             DELETE  删除 handler
//! - /api/v1/handler/:name/invoke      POST    调用 handler
//! - /api/v1/handler/:name/metadata    GET     handler 元数据
//! - /api/v1/handler/:name/bundle      GET     下载 bundle
//! - /q/openapi, /openapi.json         GET     OpenAPI 文档（可关闭）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes(openapi_enabled: bool) -> Router<Arc<AppState>> {
    let router = Router::new().nest("/api", api_routes());

    if openapi_enabled {
        router
            .route("/q/openapi", get(handlers::openapi))
            .route("/openapi.json", get(handlers::openapi))
    } else {
        router
    }
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/v1/handler", function_routes())
}

/// Handler 路由
fn function_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::list_functions))
        .route(
            "/:name",
            get(handlers::invoke_function)
                .post(handlers::upload_function)
                .delete(handlers::delete_function),
        )
        .route("/:name/invoke", post(handlers::invoke_function))
        .route("/:name/metadata", get(handlers::get_function_metadata))
        .route("/:name/bundle", get(handlers::export_function_bundle))
}
