//! Polyglot Runtime - 按语言分发调用，并限制并发执行数

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::script_runtime::{ScriptRuntime, ScriptRuntimeConfig};
use super::wasm_runtime::{WasmRuntime, WasmRuntimeConfig};
use crate::application::ports::{FunctionRuntimePort, InvocationOutput, RuntimeError};
use crate::config::RuntimeConfig;
use crate::domain::function::{FunctionBundle, FunctionName, Language};

/// 组合运行时
pub struct PolyglotRuntime {
    wasm: WasmRuntime,
    script: ScriptRuntime,
    permits: Arc<Semaphore>,
}

impl PolyglotRuntime {
    pub fn new(wasm: WasmRuntime, script: ScriptRuntime, max_concurrent: usize) -> Self {
        Self {
            wasm,
            script,
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// 从配置构建
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let wasm = WasmRuntime::new(WasmRuntimeConfig {
            export: config.wasm_export.clone(),
            timeout,
            epoch_tick: Duration::from_millis(config.epoch_tick_ms),
            max_output_size: config.max_output_size,
            max_memory: config.wasm_max_memory,
        })?;

        let interpreters = Language::ALL
            .into_iter()
            .filter_map(|language| {
                config
                    .interpreter(language)
                    .map(|command| (language, command.to_string()))
            })
            .collect();
        let script = ScriptRuntime::new(ScriptRuntimeConfig {
            interpreters,
            timeout,
            max_output_size: config.max_output_size,
        });

        Ok(Self::new(wasm, script, config.max_concurrent))
    }

    /// 启动 WASM epoch 计时任务
    pub fn spawn_epoch_ticker(&self) -> tokio::task::JoinHandle<()> {
        self.wasm.spawn_epoch_ticker()
    }

    /// 当前空闲的执行槽位
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl FunctionRuntimePort for PolyglotRuntime {
    fn supports(&self, language: Language) -> bool {
        self.wasm.supports(language) || self.script.supports(language)
    }

    async fn invoke(
        &self,
        bundle: &FunctionBundle,
        input: Vec<u8>,
    ) -> Result<InvocationOutput, RuntimeError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RuntimeError::Unavailable("Runtime is shutting down".to_string()))?;

        match bundle.language() {
            Language::Wasm => self.wasm.invoke(bundle, input).await,
            language if self.script.supports(language) => self.script.invoke(bundle, input).await,
            language => Err(RuntimeError::Unsupported(language)),
        }
    }

    fn evict(&self, name: &FunctionName) {
        self.wasm.evict(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    use crate::domain::function::FunctionMetadata;

    fn bundle(temp: &tempfile::TempDir, language: Language, file: &str, content: &[u8]) -> FunctionBundle {
        let dir = temp.path().join("poly");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file), content).unwrap();

        FunctionBundle::new(
            FunctionName::new("poly").unwrap(),
            FunctionMetadata {
                language,
                entrypoint_file: file.to_string(),
                description: None,
                env: BTreeMap::new(),
            },
            temp.path().to_path_buf(),
            0,
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_from_config_supports_all_languages() {
        let runtime = PolyglotRuntime::from_config(&RuntimeConfig::default()).unwrap();
        for language in Language::ALL {
            assert!(runtime.supports(language));
        }
        assert_eq!(runtime.available_permits(), RuntimeConfig::default().max_concurrent);
    }

    #[tokio::test]
    async fn test_dispatches_wasm() {
        let temp = tempfile::tempdir().unwrap();
        let wasm = wat::parse_str(r#"(module (func (export "handler")))"#).unwrap();
        let bundle = bundle(&temp, Language::Wasm, "main.wasm", &wasm);

        let runtime = PolyglotRuntime::from_config(&RuntimeConfig::default()).unwrap();
        let output = runtime.invoke(&bundle, Vec::new()).await.unwrap();
        assert!(output.stdout.is_empty());
        assert_eq!(runtime.available_permits(), RuntimeConfig::default().max_concurrent);
    }

    #[tokio::test]
    async fn test_evict_reaches_wasm_cache() {
        let temp = tempfile::tempdir().unwrap();
        let wasm = wat::parse_str(r#"(module (func (export "handler")))"#).unwrap();
        let bundle = bundle(&temp, Language::Wasm, "main.wasm", &wasm);

        let runtime = PolyglotRuntime::from_config(&RuntimeConfig::default()).unwrap();
        runtime.invoke(&bundle, Vec::new()).await.unwrap();
        assert_eq!(runtime.wasm.cached_modules(), 1);

        runtime.evict(bundle.name());
        assert_eq!(runtime.wasm.cached_modules(), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_script_language() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = bundle(&temp, Language::Ruby, "main.rb", b"puts 1");

        let runtime = PolyglotRuntime::new(
            WasmRuntime::new(WasmRuntimeConfig::default()).unwrap(),
            ScriptRuntime::new(ScriptRuntimeConfig {
                interpreters: HashMap::new(),
                timeout: Duration::from_secs(1),
                ..Default::default()
            }),
            1,
        );

        assert!(!runtime.supports(Language::Ruby));
        let err = runtime.invoke(&bundle, Vec::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Unsupported(Language::Ruby)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_concurrency_is_limited() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = Arc::new(bundle(&temp, Language::Python, "main.py", b"sleep 0.3"));

        let runtime = Arc::new(PolyglotRuntime::new(
            WasmRuntime::new(WasmRuntimeConfig::default()).unwrap(),
            ScriptRuntime::new(ScriptRuntimeConfig {
                interpreters: HashMap::from([(Language::Python, "sh".to_string())]),
                timeout: Duration::from_secs(5),
                ..Default::default()
            }),
            1,
        ));

        let started = std::time::Instant::now();
        let first = {
            let runtime = runtime.clone();
            let bundle = bundle.clone();
            tokio::spawn(async move { runtime.invoke(&bundle, Vec::new()).await })
        };
        let second = runtime.invoke(&bundle, Vec::new()).await;

        assert!(first.await.unwrap().is_ok());
        assert!(second.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(600));
    }
}
