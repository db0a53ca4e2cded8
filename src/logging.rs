//! 日志模块 - 同步核心的日志接口，以及文件日志和大小管理功能

use crate::config::{read_section, write_section};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

/// 同步核心使用的日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 日志接收端，由调用方注入同步核心
///
/// 核心只负责产生消息，格式化和持久化都交给实现方。
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// 转发到 tracing 的日志接收端
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }
}

/// 在内存中记录日志，便于嵌入方或测试检查
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(LogLevel, String)>> {
        // 锁中毒时仍然可以安全读取已记录的条目
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.lock().clone()
    }

    /// 指定级别的条目数
    pub fn count(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str) {
        self.lock().push((level, message.to_string()));
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// 是否启用文件日志
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// 最大日志文件大小（MB）
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u32,
    /// 日志级别: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_enabled() -> bool {
    true
}

fn default_max_size_mb() -> u32 {
    5 // 默认 5MB
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_size_mb: default_max_size_mb(),
            level: default_level(),
        }
    }
}

impl LogConfig {
    /// 从配置文件的 log 节加载，读取失败时使用默认值
    pub fn load(config_file: &Path) -> Self {
        read_section(config_file, "log").unwrap_or_default()
    }

    /// 保存到配置文件的 log 节，保留其他配置
    pub fn save(&self, config_file: &Path) -> io::Result<()> {
        write_section(config_file, "log", self)
    }

    /// 将配置的日志级别转换为 tracing Level
    pub fn tracing_level(&self) -> tracing::Level {
        match self.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

/// 当前日志文件及其写入器
struct RotatingFile {
    file_path: PathBuf,
    max_size: u64,
    writer: Option<BufWriter<File>>,
}

impl RotatingFile {
    fn open(file_path: &Path) -> io::Result<BufWriter<File>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        Ok(BufWriter::new(file))
    }

    fn oversized(&self) -> bool {
        fs::metadata(&self.file_path)
            .map(|m| m.len() > self.max_size)
            .unwrap_or(false)
    }

    /// 超过大小限制时把 app.log 改名为 app.log.old 并重新打开
    fn rotate_if_needed(&mut self) -> io::Result<()> {
        if !self.oversized() {
            return Ok(());
        }

        if let Some(mut w) = self.writer.take() {
            let _ = w.flush();
        }

        let backup_path = self.file_path.with_extension("log.old");
        if backup_path.exists() {
            fs::remove_file(&backup_path)?;
        }
        fs::rename(&self.file_path, &backup_path)?;

        self.writer = Some(Self::open(&self.file_path)?);
        Ok(())
    }
}

/// 带大小限制的日志写入器
#[derive(Clone)]
pub struct SizeRotatingWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl SizeRotatingWriter {
    pub fn new(log_dir: &Path, max_size_mb: u32) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;

        let mut file = RotatingFile {
            file_path: log_dir.join("app.log"),
            max_size: u64::from(max_size_mb) * 1024 * 1024,
            writer: None,
        };
        // 启动时如果已有文件超限，先轮转
        file.rotate_if_needed()?;
        if file.writer.is_none() {
            file.writer = Some(RotatingFile::open(&file.file_path)?);
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }

    fn lock(inner: &Mutex<RotatingFile>) -> io::Result<MutexGuard<'_, RotatingFile>> {
        inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))
    }
}

/// 日志写入器包装
pub struct LogWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = SizeRotatingWriter::lock(&self.inner)?;

        let written = match file.writer.as_mut() {
            Some(writer) => {
                let n = writer.write(buf)?;
                writer.flush()?;
                n
            }
            None => return Err(io::Error::new(io::ErrorKind::Other, "Writer not available")),
        };

        // 轮转失败不影响本次写入
        let _ = file.rotate_if_needed();
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = SizeRotatingWriter::lock(&self.inner)?;
        match file.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SizeRotatingWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            inner: self.inner.clone(),
        }
    }
}

/// 默认日志目录（跟随配置目录）
pub fn get_log_dir() -> PathBuf {
    crate::config::default_config_dir().join("logs")
}
