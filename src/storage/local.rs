use super::{DirListing, EntryKind, FileMetadata, FileSystem};
use filetime::FileTime;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// 本地文件系统实现
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>> {
        let file_type = match fs::symlink_metadata(path) {
            Ok(meta) => meta.file_type(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        Ok(Some(kind))
    }

    fn list_dir(&self, path: &Path) -> io::Result<DirListing> {
        let mut listing = DirListing::default();

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let name = entry.file_name();

            if file_type.is_symlink() {
                // 跟随链接判断目标类型；悬空链接按普通文件处理，复制时会报错
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_dir() => listing.linked_dirs.push(name),
                    _ => listing.files.push(name),
                }
            } else if file_type.is_dir() {
                listing.dirs.push(name);
            } else {
                listing.files.push(name);
            }
        }

        listing.files.sort();
        listing.dirs.sort();
        listing.linked_dirs.sort();
        Ok(listing)
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let metadata = fs::metadata(path)?;
        Ok(FileMetadata {
            len: metadata.len(),
            modified: metadata.modified()?,
        })
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to)?;

        // fs::copy 不保证保留修改时间，这里显式同步，保证下一轮元数据比较结果稳定
        let source_meta = fs::metadata(from)?;
        let mtime = FileTime::from_last_modification_time(&source_meta);
        filetime::set_file_mtime(to, mtime)?;

        Ok(())
    }

    fn clear_readonly(&self, path: &Path) -> io::Result<bool> {
        // 不跟随符号链接，避免修改链接目标的权限
        let mut permissions = fs::symlink_metadata(path)?.permissions();
        if !permissions.readonly() {
            return Ok(false);
        }

        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)?;
        Ok(true)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(fs::File::open(path)?))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}
