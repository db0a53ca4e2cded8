//! 删除清理 - 删除副本中源目录已不存在的文件和目录
//!
//! 分两个阶段，顺序不能交换：先删孤儿文件，目录在其中的孤儿文件删掉后才被判断和删除。

use crate::core::context::PassContext;
use crate::core::error::{FsOp, IoResultExt};
use crate::core::pair::DirectoryPair;
use crate::core::report::SyncResult;
use crate::storage::DirListing;
use std::ffi::{OsStr, OsString};

/// 执行两阶段删除
pub fn sweep(ctx: &PassContext<'_>, root: DirectoryPair, result: &mut SyncResult) {
    remove_orphan_files(ctx, root.clone(), result);
    remove_orphan_dirs(ctx, root, result);
}

/// 源目录中是否有同名文件
fn has_file_counterpart(source: Option<&DirListing>, name: &OsString) -> bool {
    source.is_some_and(|s| s.has_file(name))
}

/// 源目录中是否有同名目录
fn has_dir_counterpart(source: Option<&DirListing>, name: &OsString) -> bool {
    source.is_some_and(|s| s.has_dir(name))
}

/// 阶段 A：遍历副本，删除源中没有对应文件的文件
///
/// 源目录不存在的副本目录同样会被遍历，其下所有文件都是孤儿。
fn remove_orphan_files(ctx: &PassContext<'_>, root: DirectoryPair, result: &mut SyncResult) {
    let mut stack = vec![root];

    while let Some(pair) = stack.pop() {
        let replica_listing = match ctx.list_dir(&pair.replica) {
            Ok(listing) => listing,
            Err(e) => {
                ctx.fail(result, e);
                continue;
            }
        };
        let source_listing = match ctx.source_listing(&pair.source) {
            Ok(listing) => listing,
            Err(e) => {
                // 无法确认源目录内容时整个子树都不删除
                ctx.fail(result, e);
                continue;
            }
        };

        for name in &replica_listing.files {
            if has_file_counterpart(source_listing.as_ref(), name) {
                continue;
            }
            let path = pair.replica.join(name);
            match ctx.remove_replica_file(&path) {
                Ok(()) => {
                    result.files_deleted += 1;
                    ctx.log.info(&format!("删除文件: {}", path.display()));
                }
                Err(e) => ctx.fail(result, e),
            }
        }

        // 指向目录的符号链接：源中没有同名链接时只删除链接本身
        for name in &replica_listing.linked_dirs {
            if source_listing.as_ref().is_some_and(|s| s.has_linked_dir(name)) {
                continue;
            }
            let path = pair.replica.join(name);
            match ctx.fs.remove_file(&path).with_op(FsOp::RemoveFile, &path) {
                Ok(()) => {
                    result.files_deleted += 1;
                    ctx.log.info(&format!("删除符号链接: {}", path.display()));
                }
                Err(e) => ctx.fail(result, e),
            }
        }

        stack.extend(
            replica_listing
                .dirs
                .iter()
                .rev()
                .map(|name| pair.child(name)),
        );
    }
}

enum Visit {
    /// 首次进入目录：找出孤儿子目录，先处理有对应的子目录
    Enter(DirectoryPair),
    /// 所有子目录处理完毕：删除本目录下的孤儿子目录
    Leave {
        pair: DirectoryPair,
        orphans: Vec<OsString>,
    },
}

/// 阶段 B：后序遍历副本，整体删除源中没有对应目录的目录
fn remove_orphan_dirs(ctx: &PassContext<'_>, root: DirectoryPair, result: &mut SyncResult) {
    let mut stack = vec![Visit::Enter(root)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(pair) => {
                let replica_listing = match ctx.list_dir(&pair.replica) {
                    Ok(listing) => listing,
                    Err(e) => {
                        ctx.fail(result, e);
                        continue;
                    }
                };
                let source_listing = match ctx.source_listing(&pair.source) {
                    Ok(listing) => listing,
                    Err(e) => {
                        ctx.fail(result, e);
                        continue;
                    }
                };

                let (kept, orphans): (Vec<OsString>, Vec<OsString>) = replica_listing
                    .dirs
                    .into_iter()
                    .partition(|name| has_dir_counterpart(source_listing.as_ref(), name));

                // Leave 先入栈，保证在所有子目录之后出栈
                let children: Vec<DirectoryPair> =
                    kept.iter().rev().map(|name| pair.child(name)).collect();
                stack.push(Visit::Leave { pair, orphans });
                stack.extend(children.into_iter().map(Visit::Enter));
            }
            Visit::Leave { pair, orphans } => {
                for name in &orphans {
                    remove_orphan_dir(ctx, &pair, name, result);
                }
            }
        }
    }
}

fn remove_orphan_dir(
    ctx: &PassContext<'_>,
    pair: &DirectoryPair,
    name: &OsStr,
    result: &mut SyncResult,
) {
    let path = pair.replica.join(name);
    match ctx.fs.remove_dir_all(&path).with_op(FsOp::RemoveDir, &path) {
        Ok(()) => {
            result.directories_deleted += 1;
            ctx.log.info(&format!("删除目录: {}", path.display()));
        }
        Err(e) => ctx.fail(result, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CompareMode;
    use crate::logging::{LogLevel, MemorySink};
    use crate::storage::faulty::{Fault, FaultyFileSystem};
    use crate::storage::{FileSystem, LocalFileSystem};
    use std::fs;
    use std::path::Path;

    fn run_sweep(source: &Path, replica: &Path) -> SyncResult {
        run_sweep_on(&LocalFileSystem, source, replica).0
    }

    fn run_sweep_on(fs: &dyn FileSystem, source: &Path, replica: &Path) -> (SyncResult, MemorySink) {
        let sink = MemorySink::new();
        let mut result = SyncResult::default();
        let ctx = PassContext::new(fs, &sink, CompareMode::MetadataOnly);
        sweep(&ctx, DirectoryPair::new(source, replica), &mut result);
        (result, sink)
    }

    #[test]
    fn test_removes_orphan_file_keeps_matched() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("keep"), "k").unwrap();
        fs::write(dst.path().join("keep"), "k").unwrap();
        fs::write(dst.path().join("orphan"), "o").unwrap();

        let result = run_sweep(src.path(), dst.path());
        assert_eq!(result.files_deleted, 1);
        assert!(dst.path().join("keep").exists());
        assert!(!dst.path().join("orphan").exists());
    }

    #[test]
    fn test_orphan_subtree_files_then_dirs() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir_all(dst.path().join("gone/nested/deeper")).unwrap();
        fs::write(dst.path().join("gone/a"), "a").unwrap();
        fs::write(dst.path().join("gone/nested/b"), "b").unwrap();
        fs::write(dst.path().join("gone/nested/deeper/c"), "c").unwrap();

        let result = run_sweep(src.path(), dst.path());
        assert_eq!(result.files_deleted, 3);
        assert_eq!(result.directories_deleted, 1);
        assert_eq!(result.errors_encountered, 0);
        assert!(!dst.path().join("gone").exists());
    }

    #[test]
    fn test_nested_orphan_under_matched_dir() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("kept/inner")).unwrap();
        fs::create_dir_all(dst.path().join("kept/inner/stale")).unwrap();
        fs::create_dir_all(dst.path().join("kept/empty_orphan")).unwrap();

        let result = run_sweep(src.path(), dst.path());
        assert_eq!(result.directories_deleted, 2);
        assert!(dst.path().join("kept/inner").is_dir());
        assert!(!dst.path().join("kept/inner/stale").exists());
        assert!(!dst.path().join("kept/empty_orphan").exists());
    }

    #[test]
    fn test_file_where_source_has_dir_is_orphan_file() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir(src.path().join("name")).unwrap();
        fs::write(dst.path().join("name"), "file").unwrap();

        let result = run_sweep(src.path(), dst.path());
        assert_eq!(result.files_deleted, 1);
        assert!(!dst.path().join("name").exists());
    }

    #[test]
    fn test_readonly_orphan_file_removed() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let path = dst.path().join("locked");
        fs::write(&path, "x").unwrap();
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).unwrap();

        let result = run_sweep(src.path(), dst.path());
        assert_eq!(result.files_deleted, 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_deletes_do_not_stop_siblings() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            fs::write(dst.path().join(name), name).unwrap();
        }
        fs::create_dir(dst.path().join("d1")).unwrap();
        fs::create_dir(dst.path().join("d2")).unwrap();

        let faulty = FaultyFileSystem::new()
            .fail(Fault::RemoveFile, dst.path().join("b"))
            .fail(Fault::RemoveDir, dst.path().join("d1"));
        let (result, sink) = run_sweep_on(&faulty, src.path(), dst.path());

        assert_eq!(result.files_deleted, 2);
        assert_eq!(result.directories_deleted, 1);
        assert_eq!(result.errors_encountered, 2);
        assert_eq!(sink.count(LogLevel::Error), 2);
        assert!(dst.path().join("b").exists());
        assert!(dst.path().join("d1").is_dir());
        assert!(!dst.path().join("a").exists());
        assert!(!dst.path().join("c").exists());
        assert!(!dst.path().join("d2").exists());
    }

    #[test]
    fn test_unlistable_source_dir_guards_replica_subtree() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir(src.path().join("locked")).unwrap();
        fs::create_dir_all(dst.path().join("locked/old_sub")).unwrap();
        fs::write(dst.path().join("locked/stale.txt"), "s").unwrap();
        fs::write(dst.path().join("locked/old_sub/x"), "x").unwrap();
        fs::write(dst.path().join("orphan.txt"), "o").unwrap();

        let faulty = FaultyFileSystem::new().fail(Fault::ListDir, src.path().join("locked"));
        let (result, _) = run_sweep_on(&faulty, src.path(), dst.path());

        // 阶段 A 和阶段 B 各记录一次
        assert_eq!(result.errors_encountered, 2);
        assert_eq!(result.files_deleted, 1);
        assert_eq!(result.directories_deleted, 0);
        assert!(!dst.path().join("orphan.txt").exists());
        assert!(dst.path().join("locked/stale.txt").exists());
        assert!(dst.path().join("locked/old_sub/x").exists());
    }
}
