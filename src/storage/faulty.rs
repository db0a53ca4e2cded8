//! 测试用文件系统：对指定路径注入失败，其余操作转发到本地文件系统

use super::{DirListing, EntryKind, FileMetadata, FileSystem, LocalFileSystem};
use filetime::FileTime;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// 可注入的故障
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// 以该路径为源的复制失败
    Copy,
    /// 复制到该路径后只保留整秒的修改时间，模拟低精度文件系统
    CoarseMtime,
    RemoveFile,
    RemoveDir,
    ListDir,
}

#[derive(Debug, Default)]
pub struct FaultyFileSystem {
    faults: Vec<(Fault, PathBuf)>,
}

impl FaultyFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(mut self, fault: Fault, path: impl Into<PathBuf>) -> Self {
        self.faults.push((fault, path.into()));
        self
    }

    fn has(&self, fault: Fault, path: &Path) -> bool {
        self.faults.iter().any(|(f, p)| *f == fault && p == path)
    }

    fn check(&self, fault: Fault, path: &Path) -> io::Result<()> {
        if self.has(fault, path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected"));
        }
        Ok(())
    }
}

impl FileSystem for FaultyFileSystem {
    fn exists(&self, path: &Path) -> bool {
        LocalFileSystem.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        LocalFileSystem.is_dir(path)
    }

    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>> {
        LocalFileSystem.entry_kind(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<DirListing> {
        self.check(Fault::ListDir, path)?;
        LocalFileSystem.list_dir(path)
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        LocalFileSystem.metadata(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check(Fault::Copy, from)?;
        LocalFileSystem.copy_file(from, to)?;

        if self.has(Fault::CoarseMtime, to) {
            let modified = FileTime::from_last_modification_time(&std::fs::metadata(to)?);
            filetime::set_file_mtime(to, FileTime::from_unix_time(modified.unix_seconds(), 0))?;
        }
        Ok(())
    }

    fn clear_readonly(&self, path: &Path) -> io::Result<bool> {
        LocalFileSystem.clear_readonly(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.check(Fault::RemoveFile, path)?;
        LocalFileSystem.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.check(Fault::RemoveDir, path)?;
        LocalFileSystem.remove_dir_all(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        LocalFileSystem.create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        LocalFileSystem.create_dir_all(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        LocalFileSystem.open_read(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        LocalFileSystem.canonicalize(path)
    }
}
