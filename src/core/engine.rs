use crate::core::comparator::CompareMode;
use crate::core::context::PassContext;
use crate::core::error::{FsOp, IoResultExt, SyncError};
use crate::core::mirror::mirror;
use crate::core::pair::DirectoryPair;
use crate::core::report::{PassReport, SyncResult};
use crate::core::sweep::sweep;
use crate::logging::{LogSink, TracingSink};
use crate::storage::{FileSystem, LocalFileSystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// 同步引擎
///
/// 每次调用执行完整的一轮：校验根目录 → 镜像 → 删除清理。引擎本身不保存任何跨轮次状态。
#[derive(Clone)]
pub struct SyncEngine {
    fs: Arc<dyn FileSystem>,
    log: Arc<dyn LogSink>,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(Arc::new(LocalFileSystem), Arc::new(TracingSink))
    }
}

impl SyncEngine {
    pub fn new(fs: Arc<dyn FileSystem>, log: Arc<dyn LogSink>) -> Self {
        Self { fs, log }
    }

    /// 使用本地文件系统，日志写入指定接收端
    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self::new(Arc::new(LocalFileSystem), log)
    }

    /// 执行一轮同步，返回计数结果
    pub fn run(&self, source: &Path, replica: &Path, mode: CompareMode) -> SyncResult {
        self.run_pass(source, replica, mode).result
    }

    /// 执行一轮同步，返回带时间信息的报告
    pub fn run_pass(&self, source: &Path, replica: &Path, mode: CompareMode) -> PassReport {
        let started = Instant::now();
        let start_time = chrono::Utc::now().timestamp();
        let ctx = PassContext::new(self.fs.as_ref(), self.log.as_ref(), mode);
        let mut result = SyncResult::default();

        ctx.log.info(&format!(
            "开始同步: {} -> {} ({})",
            source.display(),
            replica.display(),
            mode
        ));

        match self.prepare(&ctx, source, replica, &mut result) {
            Ok(root) => {
                mirror(&ctx, root.clone(), &mut result);
                sweep(&ctx, root, &mut result);
                ctx.log.info(&format!("同步完成: {}", result));
            }
            Err(e) => {
                // 准备阶段失败：不做任何修改，整轮终止
                ctx.log.error(&format!("同步终止: {}", e));
                result.errors_encountered += 1;
            }
        }

        PassReport {
            pass_id: uuid::Uuid::new_v4(),
            start_time,
            end_time: chrono::Utc::now().timestamp(),
            duration_ms: started.elapsed().as_millis() as u64,
            mode,
            result,
        }
    }

    /// 校验根目录并确保副本根目录存在
    fn prepare(
        &self,
        ctx: &PassContext<'_>,
        source: &Path,
        replica: &Path,
        result: &mut SyncResult,
    ) -> Result<DirectoryPair, SyncError> {
        let unavailable = || SyncError::SourceUnavailable {
            path: source.to_path_buf(),
        };

        if !self.fs.is_dir(source) || self.fs.list_dir(source).is_err() {
            return Err(unavailable());
        }
        let source_canonical = self.fs.canonicalize(source).map_err(|_| unavailable())?;

        let replica_exists = self.fs.exists(replica);
        if replica_exists && !self.fs.is_dir(replica) {
            return Err(SyncError::ReplicaNotDirectory {
                path: replica.to_path_buf(),
            });
        }

        let replica_canonical = self.resolve(replica)?;
        if replica_canonical.starts_with(&source_canonical) {
            return Err(SyncError::ReplicaInsideSource {
                source_root: source.to_path_buf(),
                replica: replica.to_path_buf(),
            });
        }
        if source_canonical.starts_with(&replica_canonical) {
            return Err(SyncError::SourceInsideReplica {
                source_root: source.to_path_buf(),
                replica: replica.to_path_buf(),
            });
        }

        if !replica_exists {
            self.fs
                .create_dir_all(replica)
                .with_op(FsOp::CreateDir, replica)?;
            result.directories_created += 1;
            ctx.log.info(&format!("创建副本根目录: {}", replica.display()));
        }

        Ok(DirectoryPair::new(source, replica))
    }

    /// 规范化可能尚不存在的路径：规范化最近的已存在祖先，再拼上剩余部分
    fn resolve(&self, path: &Path) -> Result<PathBuf, SyncError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .with_op(FsOp::Canonicalize, path)?
                .join(path)
        };

        for ancestor in absolute.ancestors() {
            if !self.fs.exists(ancestor) {
                continue;
            }
            let base = self
                .fs
                .canonicalize(ancestor)
                .with_op(FsOp::Canonicalize, ancestor)?;
            let rest = absolute.strip_prefix(ancestor).unwrap_or(Path::new(""));
            return Ok(base.join(rest));
        }

        Ok(absolute)
    }
}

/// 使用本地文件系统和 tracing 日志执行一轮同步
pub fn run(source: &Path, replica: &Path, mode: CompareMode) -> SyncResult {
    SyncEngine::default().run(source, replica, mode)
}
