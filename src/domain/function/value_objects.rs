//! Function Context - Value Objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use super::FunctionError;

/// 函数名称最大长度
const MAX_NAME_LEN: usize = 100;

/// 函数名称
///
/// 名称同时作为解压目录名，因此只允许 `[A-Za-z0-9._-]`，且不能以 `.` 开头
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionName(String);

impl FunctionName {
    pub fn new(name: impl Into<String>) -> Result<Self, FunctionError> {
        let name = name.into();
        if name.is_empty() {
            return Err(FunctionError::InvalidName(
                "Function name cannot be empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(FunctionError::InvalidName(format!(
                "Function name cannot exceed {} characters",
                MAX_NAME_LEN
            )));
        }
        if name.starts_with('.') {
            return Err(FunctionError::InvalidName(format!(
                "Function name cannot start with '.': {}",
                name
            )));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(FunctionError::InvalidName(format!(
                "Function name contains invalid character {:?}: {}",
                c, name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FunctionName {
    type Error = FunctionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FunctionName> for String {
    fn from(name: FunctionName) -> Self {
        name.0
    }
}

impl std::fmt::Display for FunctionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 函数实现语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "js")]
    JavaScript,
    #[serde(rename = "python")]
    Python,
    #[serde(rename = "ruby")]
    Ruby,
    #[serde(rename = "wasm")]
    Wasm,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::JavaScript,
        Language::Python,
        Language::Ruby,
        Language::Wasm,
    ];

    /// metadata.json 中使用的语言标识
    pub fn identifier(&self) -> &'static str {
        match self {
            Language::JavaScript => "js",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Wasm => "wasm",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Bundle 元数据（bundle 根目录下的 `metadata.json`）
///
/// 不变量:
/// - entrypoint_file 必须是相对路径，且不包含 `..`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetadata {
    pub language: Language,
    pub entrypoint_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 传给脚本处理器的额外环境变量
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl FunctionMetadata {
    /// bundle 中的元数据文件名
    pub const FILE_NAME: &'static str = "metadata.json";

    /// 从 JSON 解析并校验
    pub fn from_json(bytes: &[u8]) -> Result<Self, FunctionError> {
        let metadata: Self = serde_json::from_slice(bytes)
            .map_err(|e| FunctionError::InvalidMetadata(e.to_string()))?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn validate(&self) -> Result<(), FunctionError> {
        let entry = self.entrypoint_file.trim();
        if entry.is_empty() {
            return Err(FunctionError::InvalidMetadata(
                "entrypointFile cannot be empty".to_string(),
            ));
        }

        let path = Path::new(entry);
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || entry.contains('\\') {
            return Err(FunctionError::InvalidMetadata(format!(
                "entrypointFile must be a relative path inside the bundle: {}",
                entry
            )));
        }

        if let Some(key) = self.env.keys().find(|k| k.is_empty() || k.contains('=')) {
            return Err(FunctionError::InvalidMetadata(format!(
                "invalid environment variable name: {:?}",
                key
            )));
        }

        Ok(())
    }

    /// 入口文件相对于 bundle 目录的路径
    pub fn entrypoint_relative(&self) -> PathBuf {
        PathBuf::from(self.entrypoint_file.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_name_rules() {
        assert!(FunctionName::new("rust-wasm").is_ok());
        assert!(FunctionName::new("javascript_example.v2").is_ok());
        assert!(FunctionName::new("").is_err());
        assert!(FunctionName::new("..").is_err());
        assert!(FunctionName::new(".hidden").is_err());
        assert!(FunctionName::new("a/b").is_err());
        assert!(FunctionName::new("a b").is_err());
        assert!(FunctionName::new("x".repeat(101)).is_err());
    }

    #[test]
    fn test_language_identifiers() {
        for language in Language::ALL {
            let json = format!("\"{}\"", language.identifier());
            assert_eq!(serde_json::from_str::<Language>(&json).unwrap(), language);
        }
        assert!(serde_json::from_str::<Language>("\"java\"").is_err());

        let json = serde_json::to_string(&Language::JavaScript).unwrap();
        assert_eq!(json, "\"js\"");
    }

    #[test]
    fn test_metadata_parsing() {
        let metadata =
            FunctionMetadata::from_json(br#"{"language":"wasm","entrypointFile":"hello_wasm.wasm"}"#)
                .unwrap();
        assert_eq!(metadata.language, Language::Wasm);
        assert_eq!(metadata.entrypoint_file, "hello_wasm.wasm");
        assert!(metadata.env.is_empty());
    }

    #[test]
    fn test_metadata_rejects_unknown_language() {
        let result = FunctionMetadata::from_json(br#"{"language":"cobol","entrypointFile":"a"}"#);
        assert!(matches!(result, Err(FunctionError::InvalidMetadata(_))));
    }

    #[test]
    fn test_metadata_rejects_escaping_entrypoint() {
        for entry in ["../evil.js", "/etc/passwd", "a/../../b", "", "dir\\..\\x"] {
            let json = format!(r#"{{"language":"js","entrypointFile":"{}"}}"#, entry.replace('\\', "\\\\"));
            assert!(
                FunctionMetadata::from_json(json.as_bytes()).is_err(),
                "entrypoint {:?} should be rejected",
                entry
            );
        }
    }

    #[test]
    fn test_metadata_env() {
        let metadata = FunctionMetadata::from_json(
            br#"{"language":"python","entrypointFile":"main.py","env":{"GREETING":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(metadata.env.get("GREETING").map(String::as_str), Some("hi"));
    }
}
