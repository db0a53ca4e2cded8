use crate::core::error::{FsOp, SyncError};
use crate::core::verifier;
use crate::logging::LogSink;
use crate::storage::{EntryKind, FileMetadata, FileSystem};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 比较模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareMode {
    /// 只比较大小和修改时间
    #[default]
    MetadataOnly,
    /// 元数据相同时再比较内容摘要
    ContentVerified,
}

impl std::fmt::Display for CompareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareMode::MetadataOnly => write!(f, "metadata-only"),
            CompareMode::ContentVerified => write!(f, "content-verified"),
        }
    }
}

/// 单个文件对的比较结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOutcome {
    /// 副本中不存在对应的普通文件
    MissingInReplica,
    /// 大小或修改时间不同
    MetadataDiffers,
    /// 元数据相同，未读取内容（仅元数据模式）
    MetadataSame,
    /// 元数据相同，内容摘要相同
    MetadataSameContentSame,
    /// 元数据相同，内容摘要不同
    MetadataSameContentDiffers,
    /// 元数据或内容无法读取，按需要复制处理
    Undetermined,
}

impl ComparisonOutcome {
    pub fn requires_copy(&self) -> bool {
        !matches!(
            self,
            ComparisonOutcome::MetadataSame | ComparisonOutcome::MetadataSameContentSame
        )
    }
}

/// 文件比较器
pub struct EntryComparator<'a> {
    fs: &'a dyn FileSystem,
    log: &'a dyn LogSink,
}

impl<'a> EntryComparator<'a> {
    pub fn new(fs: &'a dyn FileSystem, log: &'a dyn LogSink) -> Self {
        Self { fs, log }
    }

    /// 判断源文件是否需要复制到副本
    pub fn decide(&self, source: &Path, replica: &Path, mode: CompareMode) -> ComparisonOutcome {
        // 不跟随链接：副本中的符号链接不算对应文件
        match self.fs.entry_kind(replica) {
            Ok(Some(EntryKind::File)) => {}
            Ok(_) => return ComparisonOutcome::MissingInReplica,
            Err(e) => {
                self.warn(SyncError::io(FsOp::ReadMetadata, replica, e));
                return ComparisonOutcome::Undetermined;
            }
        }

        let (source_meta, replica_meta) = match self.read_pair(source, replica) {
            Some(pair) => pair,
            None => return ComparisonOutcome::Undetermined,
        };

        // 修改时间必须完全相等，不使用容差
        if source_meta != replica_meta {
            return ComparisonOutcome::MetadataDiffers;
        }

        match mode {
            CompareMode::MetadataOnly => ComparisonOutcome::MetadataSame,
            CompareMode::ContentVerified => self.compare_content(source, replica),
        }
    }

    fn read_pair(&self, source: &Path, replica: &Path) -> Option<(FileMetadata, FileMetadata)> {
        let read = |path: &Path| match self.fs.metadata(path) {
            Ok(meta) => Some(meta),
            Err(e) => {
                self.warn(SyncError::io(FsOp::ReadMetadata, path, e));
                None
            }
        };
        Some((read(source)?, read(replica)?))
    }

    fn compare_content(&self, source: &Path, replica: &Path) -> ComparisonOutcome {
        let digest = |path: &Path| match verifier::digest(self.fs, path) {
            Ok(d) => Some(d),
            Err(e) => {
                self.warn(SyncError::io(FsOp::Digest, path, e));
                None
            }
        };

        match (digest(source), digest(replica)) {
            (Some(a), Some(b)) if a == b => ComparisonOutcome::MetadataSameContentSame,
            (Some(_), Some(_)) => ComparisonOutcome::MetadataSameContentDiffers,
            _ => ComparisonOutcome::Undetermined,
        }
    }

    fn warn(&self, err: SyncError) {
        self.log.warning(&format!("{}，按需要复制处理", err));
    }
}
