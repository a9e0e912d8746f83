//! Invoke Command Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::InvokeFunction;
use crate::application::error::ApplicationError;
use crate::application::ports::{BundleRegistryPort, FunctionRuntimePort};
use crate::domain::function::{FunctionName, Language};

/// 调用响应
#[derive(Debug, Clone)]
pub struct InvokeFunctionResponse {
    pub invocation_id: Uuid,
    pub language: Language,
    pub output: Vec<u8>,
    pub duration_ms: u64,
}

/// InvokeFunction Handler
pub struct InvokeFunctionHandler {
    registry: Arc<dyn BundleRegistryPort>,
    runtime: Arc<dyn FunctionRuntimePort>,
}

impl InvokeFunctionHandler {
    pub fn new(
        registry: Arc<dyn BundleRegistryPort>,
        runtime: Arc<dyn FunctionRuntimePort>,
    ) -> Self {
        Self { registry, runtime }
    }

    pub async fn handle(
        &self,
        command: InvokeFunction,
    ) -> Result<InvokeFunctionResponse, ApplicationError> {
        let name = FunctionName::new(command.name)?;

        let bundle = self
            .registry
            .get(&name)
            .ok_or_else(|| ApplicationError::not_found("Handler", name.as_str()))?;

        let language = bundle.language();
        if !self.runtime.supports(language) {
            return Err(ApplicationError::RuntimeError(format!(
                "No runtime available for language: {}",
                language
            )));
        }

        let invocation_id = Uuid::new_v4();
        tracing::debug!(
            invocation_id = %invocation_id,
            name = %name,
            language = %language,
            input_bytes = command.input.len(),
            "Invoking handler"
        );

        let output = self
            .runtime
            .invoke(&bundle, command.input)
            .await
            .map_err(|e| {
                tracing::warn!(
                    invocation_id = %invocation_id,
                    name = %name,
                    error = %e,
                    "Handler invocation failed"
                );
                ApplicationError::from(e)
            })?;

        tracing::info!(
            invocation_id = %invocation_id,
            name = %name,
            language = %language,
            duration_ms = output.duration_ms,
            output_bytes = output.stdout.len(),
            "Handler invoked"
        );

        Ok(InvokeFunctionResponse {
            invocation_id,
            language,
            output: output.stdout,
            duration_ms: output.duration_ms,
        })
    }
}
