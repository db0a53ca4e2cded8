pub mod config;
pub mod core;
pub mod logging;
pub mod scheduler;
pub mod storage;

pub use crate::core::{run, CompareMode, PassReport, SyncEngine, SyncResult};
pub use crate::logging::{LogLevel, LogSink, MemorySink, TracingSink};
pub use crate::scheduler::{PassJob, PassScheduler};
pub use crate::storage::{FileSystem, LocalFileSystem};
