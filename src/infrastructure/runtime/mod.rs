//! Function Runtimes - FunctionRuntimePort 实现
//!
//! - WasmRuntime: wasmtime + WASI，stdin/stdout 管道
//! - ScriptRuntime: 外部解释器子进程
//! - PolyglotRuntime: 按语言分发，限制并发

mod polyglot;
mod script_runtime;
mod wasm_runtime;

pub use polyglot::PolyglotRuntime;
pub use script_runtime::{ScriptRuntime, ScriptRuntimeConfig};
pub use wasm_runtime::{WasmRuntime, WasmRuntimeConfig};
