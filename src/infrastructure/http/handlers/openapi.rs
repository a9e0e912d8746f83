//! OpenAPI 文档

use axum::Json;
use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/Error" } }
        }
    })
}

fn name_parameter() -> Value {
    json!({
        "name": "name",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "pattern": "^[A-Za-z0-9_-][A-Za-z0-9._-]{0,99}$" }
    })
}

/// 构建 OpenAPI 3.0 文档
pub fn openapi_document() -> Value {
    let invoke_operation = |operation_id: &str| {
        json!({
            "operationId": operation_id,
            "summary": "Invoke a handler with the request body as input",
            "parameters": [name_parameter()],
            "requestBody": {
                "required": false,
                "content": { "application/json": { "schema": {} } }
            },
            "responses": {
                "200": {
                    "description": "Handler output",
                    "content": { "application/json": { "schema": {} } }
                },
                "404": error_response("Unknown handler"),
                "500": error_response("Handler failed"),
                "504": error_response("Handler timed out")
            }
        })
    };

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "polyfaas",
            "description": "Polyglot function runtime: upload zip bundles and invoke them over HTTP",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/api/ping": {
                "get": {
                    "operationId": "ping",
                    "summary": "Health check",
                    "responses": { "200": { "description": "Service is up" } }
                }
            },
            "/api/v1/handler": {
                "get": {
                    "operationId": "listHandlers",
                    "summary": "List registered handlers",
                    "responses": {
                        "200": {
                            "description": "Handlers sorted by name",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Handler" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/api/v1/handler/{name}": {
                "post": {
                    "operationId": "uploadHandler",
                    "summary": "Upload a zip bundle containing metadata.json",
                    "parameters": [name_parameter()],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "file": { "type": "string", "format": "binary" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Handler registered",
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Status" } }
                            }
                        },
                        "400": error_response("Invalid bundle"),
                        "413": error_response("Bundle exceeds limits")
                    }
                },
                "get": invoke_operation("invokeHandler"),
                "delete": {
                    "operationId": "deleteHandler",
                    "summary": "Remove a handler",
                    "parameters": [name_parameter()],
                    "responses": {
                        "200": {
                            "description": "Handler removed",
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Status" } }
                            }
                        },
                        "404": error_response("Unknown handler")
                    }
                }
            },
            "/api/v1/handler/{name}/invoke": {
                "post": invoke_operation("invokeHandlerPost")
            },
            "/api/v1/handler/{name}/metadata": {
                "get": {
                    "operationId": "getHandlerMetadata",
                    "summary": "Describe a handler",
                    "parameters": [name_parameter()],
                    "responses": {
                        "200": {
                            "description": "Handler summary",
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Handler" } }
                            }
                        },
                        "404": error_response("Unknown handler")
                    }
                }
            },
            "/api/v1/handler/{name}/bundle": {
                "get": {
                    "operationId": "downloadHandlerBundle",
                    "summary": "Download the handler files as a zip archive",
                    "parameters": [name_parameter()],
                    "responses": {
                        "200": {
                            "description": "Zip archive",
                            "content": {
                                "application/zip": { "schema": { "type": "string", "format": "binary" } }
                            }
                        },
                        "404": error_response("Unknown handler")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Error": {
                    "type": "object",
                    "required": ["error"],
                    "properties": { "error": { "type": "string" } }
                },
                "Status": {
                    "type": "object",
                    "required": ["status", "message"],
                    "properties": {
                        "status": { "type": "string" },
                        "message": { "type": "string" }
                    }
                },
                "Handler": {
                    "type": "object",
                    "required": ["name", "language", "entrypoint", "fileCount", "archiveSize", "uploadedAt"],
                    "properties": {
                        "name": { "type": "string" },
                        "language": { "type": "string", "enum": ["js", "python", "ruby", "wasm"] },
                        "entrypoint": { "type": "string" },
                        "description": { "type": "string" },
                        "fileCount": { "type": "integer" },
                        "archiveSize": { "type": "integer" },
                        "uploadedAt": { "type": "string", "format": "date-time" }
                    }
                }
            }
        }
    })
}

/// OpenAPI endpoint
pub async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_handler_routes() {
        let doc = openapi_document();
        assert_eq!(doc["openapi"], "3.0.3");

        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/api/v1/handler",
            "/api/v1/handler/{name}",
            "/api/v1/handler/{name}/invoke",
            "/api/v1/handler/{name}/metadata",
            "/api/v1/handler/{name}/bundle",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }

        let methods = paths["/api/v1/handler/{name}"].as_object().unwrap();
        assert!(methods.contains_key("get"));
        assert!(methods.contains_key("post"));
        assert!(methods.contains_key("delete"));
    }
}
