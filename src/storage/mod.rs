pub mod local;
#[cfg(test)]
pub(crate) mod faulty;

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use local::LocalFileSystem;

/// 文件元数据（每次比较时重新读取，不做缓存）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub len: u64,
    pub modified: SystemTime,
}

/// 路径本身的类型（不跟随符号链接）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// 单层目录列举结果（不递归），名称已排序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    /// 普通文件（包括指向文件的符号链接）
    pub files: Vec<OsString>,
    /// 子目录
    pub dirs: Vec<OsString>,
    /// 指向目录的符号链接，不会被遍历
    pub linked_dirs: Vec<OsString>,
}

impl DirListing {
    pub fn has_file(&self, name: &OsString) -> bool {
        self.files.binary_search(name).is_ok()
    }

    pub fn has_dir(&self, name: &OsString) -> bool {
        self.dirs.binary_search(name).is_ok()
    }

    pub fn has_linked_dir(&self, name: &OsString) -> bool {
        self.linked_dirs.binary_search(name).is_ok()
    }
}

/// 文件系统抽象接口
///
/// 同步核心只通过这个接口访问文件系统，所有调用都是阻塞的。
pub trait FileSystem: Send + Sync {
    /// 路径是否存在（跟随符号链接）
    fn exists(&self, path: &Path) -> bool;

    /// 路径是否为目录（跟随符号链接）
    fn is_dir(&self, path: &Path) -> bool;

    /// 路径本身的类型，不跟随符号链接；不存在时返回 None
    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>>;

    /// 列出目录下的文件和子目录
    fn list_dir(&self, path: &Path) -> io::Result<DirListing>;

    /// 读取文件大小和修改时间
    fn metadata(&self, path: &Path) -> io::Result<FileMetadata>;

    /// 覆盖复制文件，并把源文件的修改时间写到目标文件上
    ///
    /// 目标文件系统的时间精度低于源时，写入的时间会被截断。
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// 清除只读属性，返回文件原本是否为只读
    fn clear_readonly(&self, path: &Path) -> io::Result<bool>;

    /// 删除文件
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// 递归删除目录
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// 创建单个目录（父目录必须已存在）
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// 创建目录及其所有缺失的父目录
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// 打开文件用于流式读取
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// 规范化路径
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}
