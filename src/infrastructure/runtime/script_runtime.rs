//! Script Runtime - 通过外部解释器执行 JS / Python / Ruby 处理器
//!
//! 解释器以入口文件为参数启动，工作目录为 bundle 目录；
//! 请求体写入 stdin，stdout 作为响应

use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStderr, Command};

use crate::application::ports::{FunctionRuntimePort, InvocationOutput, RuntimeError};
use crate::domain::function::{FunctionBundle, Language};

/// stderr 在错误信息中保留的最大字节数
const STDERR_LIMIT: usize = 4096;

/// 脚本运行时配置
#[derive(Debug, Clone)]
pub struct ScriptRuntimeConfig {
    /// 语言 -> 解释器命令
    pub interpreters: HashMap<Language, String>,
    /// 单次调用超时
    pub timeout: Duration,
    /// stdout 上限（字节）
    pub max_output_size: usize,
}

impl Default for ScriptRuntimeConfig {
    fn default() -> Self {
        Self {
            interpreters: HashMap::from([
                (Language::JavaScript, "node".to_string()),
                (Language::Python, "python3".to_string()),
                (Language::Ruby, "ruby".to_string()),
            ]),
            timeout: Duration::from_secs(30),
            max_output_size: 10 * 1024 * 1024,
        }
    }
}

/// 脚本运行时
pub struct ScriptRuntime {
    config: ScriptRuntimeConfig,
}

impl ScriptRuntime {
    pub fn new(config: ScriptRuntimeConfig) -> Self {
        Self { config }
    }

    fn interpreter(&self, language: Language) -> Option<&str> {
        self.config.interpreters.get(&language).map(String::as_str)
    }

    fn build_command(interpreter: &str, bundle: &FunctionBundle) -> Command {
        let mut command = Command::new(interpreter);
        command
            .arg(bundle.entrypoint_path())
            .current_dir(bundle.directory())
            .env("FUNCTION_NAME", bundle.name().as_str())
            .env("FUNCTION_LANGUAGE", bundle.language().identifier())
            .envs(&bundle.metadata().env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn truncate_stderr(stderr: &[u8]) -> String {
        let end = stderr.len().min(STDERR_LIMIT);
        String::from_utf8_lossy(&stderr[..end]).trim().to_string()
    }

    /// 最多读取 `limit + 1` 字节，调用方据此判断是否超限
    async fn read_capped<R: AsyncRead + Unpin>(reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        reader
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut buf)
            .await?;
        Ok(buf)
    }

    /// 保留 stderr 开头部分，其余读出丢弃，避免子进程阻塞在管道上
    async fn collect_stderr(mut stderr: ChildStderr) -> Vec<u8> {
        let mut buf = Vec::new();
        if (&mut stderr)
            .take(STDERR_LIMIT as u64)
            .read_to_end(&mut buf)
            .await
            .is_ok()
        {
            let _ = tokio::io::copy(&mut stderr, &mut tokio::io::sink()).await;
        }
        buf
    }
}

#[async_trait]
impl FunctionRuntimePort for ScriptRuntime {
    fn supports(&self, language: Language) -> bool {
        self.interpreter(language).is_some()
    }

    async fn invoke(
        &self,
        bundle: &FunctionBundle,
        input: Vec<u8>,
    ) -> Result<InvocationOutput, RuntimeError> {
        let interpreter = self
            .interpreter(bundle.language())
            .ok_or(RuntimeError::Unsupported(bundle.language()))?;

        let entrypoint = bundle.entrypoint_path();
        if !entrypoint.is_file() {
            return Err(RuntimeError::EntrypointMissing(entrypoint.display().to_string()));
        }

        let started = Instant::now();
        let mut child = Self::build_command(interpreter, bundle)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    RuntimeError::Unavailable(format!("Interpreter '{}' not found", interpreter))
                }
                _ => RuntimeError::from(e),
            })?;

        let stdin = child.stdin.take();
        let feed = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                // 处理器不读取 stdin 时会出现 BrokenPipe，忽略
                match stdin.write_all(&input).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        });
        let stderr = child.stderr.take().map(|stderr| tokio::spawn(Self::collect_stderr(stderr)));
        let stdout = child.stdout.take();
        let limit = self.config.max_output_size;

        let run = async move {
            let stdout = match stdout {
                Some(stdout) => Self::read_capped(stdout, limit).await?,
                None => Vec::new(),
            };

            if stdout.len() > limit {
                feed.abort();
                child.kill().await?;
                return Err(RuntimeError::OutputLimit(limit));
            }

            let status = child.wait().await?;
            if let Ok(Err(e)) = feed.await {
                return Err(RuntimeError::from(e));
            }
            let stderr = match stderr {
                Some(task) => task.await.unwrap_or_default(),
                None => Vec::new(),
            };
            Ok((status, stdout, stderr))
        };

        // 超时后 future 被丢弃，kill_on_drop 负责结束子进程
        let (status, stdout, stderr) = tokio::time::timeout(self.config.timeout, run)
            .await
            .map_err(|_| RuntimeError::Timeout(self.config.timeout.as_millis() as u64))??;

        if !stderr.is_empty() {
            tracing::debug!(
                name = %bundle.name(),
                stderr = %Self::truncate_stderr(&stderr),
                "Handler stderr"
            );
        }

        if !status.success() {
            return Err(RuntimeError::Exit {
                code: status.code().unwrap_or(-1),
                stderr: Self::truncate_stderr(&stderr),
            });
        }

        Ok(InvocationOutput {
            stdout,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}
