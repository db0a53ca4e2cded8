//! 同步错误类型

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 单个条目上的文件系统操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    ListDir,
    ReadMetadata,
    Digest,
    ClearReadonly,
    Copy,
    CreateDir,
    RemoveFile,
    RemoveDir,
    Canonicalize,
}

impl std::fmt::Display for FsOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FsOp::ListDir => "列出目录",
            FsOp::ReadMetadata => "读取元数据",
            FsOp::Digest => "计算摘要",
            FsOp::ClearReadonly => "清除只读属性",
            FsOp::Copy => "复制文件",
            FsOp::CreateDir => "创建目录",
            FsOp::RemoveFile => "删除文件",
            FsOp::RemoveDir => "删除目录",
            FsOp::Canonicalize => "规范化路径",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// 源目录不存在或不可访问，整轮同步终止
    #[error("源目录不存在或不可访问: {}", path.display())]
    SourceUnavailable { path: PathBuf },

    #[error("副本路径已存在但不是目录: {}", path.display())]
    ReplicaNotDirectory { path: PathBuf },

    #[error("副本目录 {} 位于源目录 {} 之内", replica.display(), source_root.display())]
    ReplicaInsideSource {
        source_root: PathBuf,
        replica: PathBuf,
    },

    #[error("源目录 {} 位于副本目录 {} 之内", source_root.display(), replica.display())]
    SourceInsideReplica {
        source_root: PathBuf,
        replica: PathBuf,
    },

    /// 单个条目操作失败，只影响该条目
    #[error("{op}失败: {} ({source})", path.display())]
    Io {
        op: FsOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    pub fn io(op: FsOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// 为 io::Result 附加操作和路径
pub trait IoResultExt<T> {
    fn with_op(self, op: FsOp, path: &std::path::Path) -> Result<T, SyncError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_op(self, op: FsOp, path: &std::path::Path) -> Result<T, SyncError> {
        self.map_err(|e| SyncError::io(op, path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message_names_op_and_path() {
        let err: Result<(), SyncError> = Err(io::Error::from(io::ErrorKind::PermissionDenied))
            .with_op(FsOp::Copy, std::path::Path::new("/replica/a.txt"));
        let err = err.unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("复制文件失败: /replica/a.txt"));
    }

    #[test]
    fn test_setup_failure_message() {
        let err = SyncError::SourceUnavailable {
            path: PathBuf::from("/missing"),
        };
        assert!(err.to_string().contains("/missing"));
    }
}
