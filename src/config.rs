//! 配置管理模块
//!
//! 提供TOML配置文件的读取、写入和自动发现功能。

use crate::error::Result;
use crate::types::{BackendConfig, CacheConfig, ChunkingConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认查找的配置文件
const DEFAULT_LOCATIONS: [&str; 3] = [
    "pptx-translator.toml",
    "config.toml",
    ".pptx-translator.toml",
];

/// 翻译器配置结构
///
/// 包含后端、分块、重试和缓存的全部配置，支持从TOML文件加载和保存。
/// 缺失的字段使用默认值。
///
/// # 示例
///
/// ```rust,no_run
/// use pptx_translator::TranslatorConfig;
///
/// // 从默认位置加载配置
/// let config = TranslatorConfig::load_from_default_locations();
///
/// // 从指定文件加载配置
/// let config = TranslatorConfig::from_file("pptx-translator.toml").unwrap();
///
/// // 保存配置到文件
/// config.save_to_file("output.toml").unwrap();
/// ```
///
/// ```toml
/// [backend]
/// model = "claude-3-5-sonnet-20240620"
/// api_key_env = "ANTHROPIC_API_KEY"
/// temperature = 0.2
///
/// [chunking]
/// max_tokens = 1750
///
/// [retry]
/// max_attempts = 10
/// delay_secs = 5.0
///
/// [cache]
/// capacity = 1000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl TranslatorConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 解析并校验配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.retry.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from multiple possible locations
    pub fn load_from_default_locations() -> Self {
        for path in DEFAULT_LOCATIONS {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from: {}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Self::default()
    }

    /// Generate example configuration file
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}
