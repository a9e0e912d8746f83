//! WASM Runtime - 基于 wasmtime + WASI 的函数执行
//!
//! 处理器约定：请求体从 stdin 读入，JSON 结果写到 stdout。
//! 模块导出无参无返回值的 `handler` 函数（名称可配置），
//! reactor 模块的 `_initialize` 会在调用前执行。

use async_trait::async_trait;
use dashmap::DashMap;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use wasi_common::pipe::{ReadPipe, WritePipe};
use wasmtime::{
    Config, Engine, ExternType, Linker, Module, Store, StoreLimits, StoreLimitsBuilder, Trap,
};
use wasmtime_wasi::sync::WasiCtxBuilder;
use wasmtime_wasi::WasiCtx;

use crate::application::ports::{FunctionRuntimePort, InvocationOutput, RuntimeError};
use crate::domain::function::{FunctionBundle, FunctionName, Language};

struct HostState {
    wasi: WasiCtx,
    limits: StoreLimits,
}

/// 带上限的 stdout 缓冲，超出后拒绝写入并记录溢出
#[derive(Debug)]
struct CappedOutput {
    buf: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl CappedOutput {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            overflowed: false,
        }
    }
}

impl Write for CappedOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len().saturating_add(data.len()) > self.limit {
            self.overflowed = true;
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "handler output limit exceeded",
            ));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// WASM 运行时配置
#[derive(Debug, Clone)]
pub struct WasmRuntimeConfig {
    /// 被调用的导出函数名
    pub export: String,
    /// 单次调用超时
    pub timeout: Duration,
    /// epoch 递增间隔
    pub epoch_tick: Duration,
    /// stdout 上限（字节）
    pub max_output_size: usize,
    /// 线性内存上限（字节）
    pub max_memory: usize,
}

impl Default for WasmRuntimeConfig {
    fn default() -> Self {
        Self {
            export: "handler".to_string(),
            timeout: Duration::from_secs(30),
            epoch_tick: Duration::from_millis(10),
            max_output_size: 10 * 1024 * 1024,
            max_memory: 256 * 1024 * 1024,
        }
    }
}

impl WasmRuntimeConfig {
    /// 超时对应的 epoch 数（至少为 1）
    fn deadline_ticks(&self) -> u64 {
        let tick = self.epoch_tick.as_millis().max(1);
        (self.timeout.as_millis() / tick).max(1) as u64
    }
}

/// 已编译模块，入口路径或修改时间变化即失效
struct CachedModule {
    path: PathBuf,
    modified: SystemTime,
    module: Module,
}

/// 单次执行的参数
struct Execution {
    export: String,
    input: Vec<u8>,
    deadline_ticks: u64,
    timeout_ms: u64,
    max_output_size: usize,
    max_memory: usize,
}

/// WASM 运行时
///
/// 超时依赖 epoch 中断：需要调用 `spawn_epoch_ticker` 启动计时任务，
/// 否则 epoch 不会前进，调用不会被中断
pub struct WasmRuntime {
    engine: Engine,
    config: WasmRuntimeConfig,
    /// 编译缓存: 函数名 -> 已编译模块
    modules: DashMap<FunctionName, CachedModule>,
}

impl WasmRuntime {
    pub fn new(config: WasmRuntimeConfig) -> Result<Self, RuntimeError> {
        let mut engine_config = Config::new();
        engine_config.epoch_interruption(true);
        let engine = Engine::new(&engine_config)
            .map_err(|e| RuntimeError::Unavailable(format!("Failed to create WASM engine: {}", e)))?;

        Ok(Self {
            engine,
            config,
            modules: DashMap::new(),
        })
    }

    /// 启动 epoch 计时任务
    pub fn spawn_epoch_ticker(&self) -> tokio::task::JoinHandle<()> {
        let engine = self.engine.clone();
        let tick = self.config.epoch_tick;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                engine.increment_epoch();
            }
        })
    }

    /// 已缓存的模块数
    pub fn cached_modules(&self) -> usize {
        self.modules.len()
    }

    fn modified_time(path: &Path) -> Result<SystemTime, RuntimeError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(meta.modified()?),
            Ok(_) => Err(RuntimeError::EntrypointMissing(path.display().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(RuntimeError::EntrypointMissing(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 加载模块，入口文件未变化时复用已编译的 Module
    fn load_module(&self, bundle: &FunctionBundle) -> Result<Module, RuntimeError> {
        let path = bundle.entrypoint_path();
        let modified = Self::modified_time(&path)?;

        if let Some(cached) = self.modules.get(bundle.name()) {
            if cached.path == path && cached.modified == modified {
                return Ok(cached.module.clone());
            }
        }

        let bytes = std::fs::read(&path)?;
        let module = Module::from_binary(&self.engine, &bytes)
            .map_err(|e| RuntimeError::Compile(format!("{:#}", e)))?;

        tracing::debug!(name = %bundle.name(), size = bytes.len(), "WASM module compiled");
        self.modules.insert(
            bundle.name().clone(),
            CachedModule {
                path,
                modified,
                module: module.clone(),
            },
        );

        Ok(module)
    }

    fn execute(
        engine: &Engine,
        module: &Module,
        execution: Execution,
    ) -> Result<Vec<u8>, RuntimeError> {
        let stdout_pipe = WritePipe::new(CappedOutput::new(execution.max_output_size));
        let stdin_pipe = ReadPipe::new(Cursor::new(execution.input));

        let wasi = WasiCtxBuilder::new()
            .stdin(Box::new(stdin_pipe))
            .stdout(Box::new(stdout_pipe.clone()))
            .inherit_stderr()
            .build();
        let limits = StoreLimitsBuilder::new()
            .memory_size(execution.max_memory)
            .build();

        let mut linker = Linker::new(engine);
        wasmtime_wasi::add_to_linker(&mut linker, |state: &mut HostState| &mut state.wasi)
            .map_err(|e| RuntimeError::Unavailable(format!("Failed to add WASI to linker: {}", e)))?;

        let timeout_ms = execution.timeout_ms;
        {
            let mut store = Store::new(engine, HostState { wasi, limits });
            store.limiter(|state| &mut state.limits);
            store.set_epoch_deadline(execution.deadline_ticks);

            let instance = linker
                .instantiate(&mut store, module)
                .map_err(|e| RuntimeError::Compile(format!("Failed to instantiate module: {:#}", e)))?;

            if let Ok(init) = instance.get_typed_func::<(), ()>(&mut store, "_initialize") {
                init.call(&mut store, ())
                    .or_else(|e| Self::classify_error(e, timeout_ms))?;
            }

            let handler = instance
                .get_typed_func::<(), ()>(&mut store, &execution.export)
                .map_err(|_| RuntimeError::ExportNotFound {
                    export: execution.export.clone(),
                    available: Self::exported_functions(module),
                })?;

            handler
                .call(&mut store, ())
                .or_else(|e| Self::classify_error(e, timeout_ms))?;
        }

        let output = stdout_pipe
            .try_into_inner()
            .map_err(|_| RuntimeError::IoError("Failed to collect WASM stdout".to_string()))?;

        if output.overflowed {
            return Err(RuntimeError::OutputLimit(output.limit));
        }

        Ok(output.buf)
    }

    /// `proc_exit(0)` 视为正常结束
    fn classify_error(err: wasmtime::Error, timeout_ms: u64) -> Result<(), RuntimeError> {
        if let Some(exit) = err.downcast_ref::<wasi_common::I32Exit>() {
            if exit.0 == 0 {
                return Ok(());
            }
            return Err(RuntimeError::Exit {
                code: exit.0,
                stderr: String::new(),
            });
        }

        if let Some(Trap::Interrupt) = err.downcast_ref::<Trap>() {
            return Err(RuntimeError::Timeout(timeout_ms));
        }

        Err(RuntimeError::Trap(format!("{:#}", err)))
    }

    fn exported_functions(module: &Module) -> Vec<String> {
        module
            .exports()
            .filter(|export| matches!(export.ty(), ExternType::Func(_)))
            .map(|export| export.name().to_string())
            .collect()
    }
}

#[async_trait]
impl FunctionRuntimePort for WasmRuntime {
    fn supports(&self, language: Language) -> bool {
        language == Language::Wasm
    }

    async fn invoke(
        &self,
        bundle: &FunctionBundle,
        input: Vec<u8>,
    ) -> Result<InvocationOutput, RuntimeError> {
        if bundle.language() != Language::Wasm {
            return Err(RuntimeError::Unsupported(bundle.language()));
        }

        let module = self.load_module(bundle)?;
        let engine = self.engine.clone();
        let execution = Execution {
            export: self.config.export.clone(),
            input,
            deadline_ticks: self.config.deadline_ticks(),
            timeout_ms: self.config.timeout.as_millis() as u64,
            max_output_size: self.config.max_output_size,
            max_memory: self.config.max_memory,
        };

        let started = Instant::now();
        let stdout = tokio::task::spawn_blocking(move || Self::execute(&engine, &module, execution))
            .await
            .map_err(|e| RuntimeError::Trap(format!("WASM task failed: {}", e)))??;

        Ok(InvocationOutput {
            stdout,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn evict(&self, name: &FunctionName) {
        if self.modules.remove(name).is_some() {
            tracing::debug!(name = %name, "WASM module evicted");
        }
    }
}
