//! 应用配置模块
//!
//! 所有配置保存在同一个 config.json 中，按节（sync / log）划分。

use crate::core::CompareMode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "config.json";

/// 同步配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// 源目录
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// 副本目录
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica: Option<PathBuf>,
    /// 元数据相同时是否再比较文件内容
    #[serde(default)]
    pub verify_content: bool,
    /// 周期同步间隔（秒），为空表示只执行一次
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

impl SyncSettings {
    /// 从配置文件的 sync 节加载，读取失败时使用默认值
    pub fn load(config_file: &Path) -> Self {
        read_section(config_file, "sync").unwrap_or_default()
    }

    /// 保存到配置文件的 sync 节，保留其他配置
    pub fn save(&self, config_file: &Path) -> io::Result<()> {
        write_section(config_file, "sync", self)
    }

    pub fn compare_mode(&self) -> CompareMode {
        if self.verify_content {
            CompareMode::ContentVerified
        } else {
            CompareMode::MetadataOnly
        }
    }
}

/// 默认配置目录
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("mirrorsync"))
        .unwrap_or_else(|| PathBuf::from(".mirrorsync"))
}

/// 默认配置文件路径
pub fn default_config_file() -> PathBuf {
    default_config_dir().join(CONFIG_FILE_NAME)
}

/// 读取配置文件中的一个节，文件或节不存在、格式错误时返回 None
pub fn read_section<T: DeserializeOwned>(config_file: &Path, key: &str) -> Option<T> {
    let content = fs::read_to_string(config_file).ok()?;
    let mut config = serde_json::from_str::<serde_json::Value>(&content).ok()?;
    let section = config.get_mut(key)?.take();
    match serde_json::from_value(section) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("配置节 {} 格式错误，使用默认值: {}", key, e);
            None
        }
    }
}

/// 写入配置文件中的一个节，保留其他节
pub fn write_section<T: Serialize>(config_file: &Path, key: &str, value: &T) -> io::Result<()> {
    let mut config: serde_json::Value = match fs::read_to_string(config_file) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|_| serde_json::json!({})),
        Err(e) if e.kind() == io::ErrorKind::NotFound => serde_json::json!({}),
        Err(e) => return Err(e),
    };
    if !config.is_object() {
        config = serde_json::json!({});
    }

    config[key] = serde_json::to_value(value).map_err(io::Error::other)?;

    if let Some(parent) = config_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(&config).map_err(io::Error::other)?;
    fs::write(config_file, content)
}
