use crate::core::comparator::{CompareMode, EntryComparator};
use crate::core::error::{FsOp, IoResultExt, SyncError};
use crate::core::report::SyncResult;
use crate::logging::LogSink;
use crate::storage::{DirListing, FileSystem};
use std::io;
use std::path::Path;

/// 一轮同步中各组件共享的只读环境
#[derive(Clone, Copy)]
pub struct PassContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub log: &'a dyn LogSink,
    pub mode: CompareMode,
}

impl<'a> PassContext<'a> {
    pub fn new(fs: &'a dyn FileSystem, log: &'a dyn LogSink, mode: CompareMode) -> Self {
        Self { fs, log, mode }
    }

    pub fn comparator(&self) -> EntryComparator<'a> {
        EntryComparator::new(self.fs, self.log)
    }

    /// 记录单个条目的失败并继续
    pub fn fail(&self, result: &mut SyncResult, err: SyncError) {
        self.log.error(&err.to_string());
        result.errors_encountered += 1;
    }

    pub fn list_dir(&self, path: &Path) -> Result<DirListing, SyncError> {
        self.fs.list_dir(path).with_op(FsOp::ListDir, path)
    }

    /// 列出源目录；源目录不存在（或是文件）时返回 None，其下副本条目全部视为孤儿
    ///
    /// 其他错误（如无权限）必须向上返回，不能当作"不存在"，否则会误删副本。
    pub fn source_listing(&self, path: &Path) -> Result<Option<DirListing>, SyncError> {
        match self.fs.list_dir(path) {
            Ok(listing) => Ok(Some(listing)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(_) if self.fs.exists(path) && !self.fs.is_dir(path) => Ok(None),
            Err(e) => Err(SyncError::io(FsOp::ListDir, path, e)),
        }
    }

    /// 删除副本文件，必要时先清除只读属性
    pub fn remove_replica_file(&self, path: &Path) -> Result<(), SyncError> {
        self.fs
            .clear_readonly(path)
            .with_op(FsOp::ClearReadonly, path)?;
        self.fs.remove_file(path).with_op(FsOp::RemoveFile, path)
    }
}
