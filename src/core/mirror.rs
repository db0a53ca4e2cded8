//! 目录树镜像 - 把源目录树的结构和文件复制到副本
//!
//! 使用显式工作栈代替递归，目录嵌套深度不影响调用栈。

use crate::core::comparator::{ComparisonOutcome, EntryComparator};
use crate::core::context::PassContext;
use crate::core::error::{FsOp, IoResultExt, SyncError};
use crate::core::pair::DirectoryPair;
use crate::core::report::SyncResult;
use crate::storage::EntryKind;
use std::ffi::OsStr;
use std::path::Path;

/// 镜像源目录树到副本，单个条目的失败只计数不中断
pub fn mirror(ctx: &PassContext<'_>, root: DirectoryPair, result: &mut SyncResult) {
    let comparator = ctx.comparator();
    let mut stack = vec![root];

    while let Some(pair) = stack.pop() {
        // 源目录可能在入栈之后被删除
        let listing = match ctx.list_dir(&pair.source) {
            Ok(listing) => listing,
            Err(e) => {
                ctx.fail(result, e);
                continue;
            }
        };

        for name in &listing.files {
            if let Err(e) = mirror_file(ctx, &comparator, &pair, name, result) {
                ctx.fail(result, e);
            }
        }

        for name in &listing.linked_dirs {
            ctx.log.info(&format!(
                "跳过指向目录的符号链接: {}",
                pair.source.join(name).display()
            ));
        }

        let mut children = Vec::with_capacity(listing.dirs.len());
        for name in &listing.dirs {
            match ensure_replica_dir(ctx, &pair, name, result) {
                Ok(child) => children.push(child),
                Err(e) => ctx.fail(result, e),
            }
        }
        // 逆序入栈，出栈时按名称顺序处理
        stack.extend(children.into_iter().rev());
    }
}

/// 同步单个文件
fn mirror_file(
    ctx: &PassContext<'_>,
    comparator: &EntryComparator<'_>,
    pair: &DirectoryPair,
    name: &OsStr,
    result: &mut SyncResult,
) -> Result<(), SyncError> {
    let (source, replica) = pair.entry(name);

    match replica_kind(ctx, &replica)? {
        // 副本中同名条目是目录，先整体删除再复制文件
        Some(EntryKind::Dir) => {
            ctx.fs
                .remove_dir_all(&replica)
                .with_op(FsOp::RemoveDir, &replica)?;
            result.directories_deleted += 1;
            ctx.log.info(&format!("删除与源文件同名的目录: {}", replica.display()));
        }
        // 不能通过副本中的链接写入，先删除链接本身
        Some(EntryKind::Symlink) => remove_replica_link(ctx, &replica, result)?,
        Some(EntryKind::File) | None => {}
    }

    let outcome = comparator.decide(&source, &replica, ctx.mode);
    if !outcome.requires_copy() {
        return Ok(());
    }

    let existed = outcome != ComparisonOutcome::MissingInReplica;
    if existed {
        ctx.fs
            .clear_readonly(&replica)
            .with_op(FsOp::ClearReadonly, &replica)?;
    }

    ctx.fs.copy_file(&source, &replica).with_op(FsOp::Copy, &replica)?;
    check_preserved_mtime(ctx, &source, &replica);

    if existed {
        result.files_updated += 1;
        ctx.log.info(&format!("更新文件: {}", replica.display()));
    } else {
        result.files_copied += 1;
        ctx.log.info(&format!("复制文件: {}", replica.display()));
    }
    Ok(())
}

/// 副本文件系统时间精度不足时，元数据比较每轮都会判定不同
fn check_preserved_mtime(ctx: &PassContext<'_>, source: &Path, replica: &Path) {
    let (Ok(source_meta), Ok(replica_meta)) = (ctx.fs.metadata(source), ctx.fs.metadata(replica))
    else {
        return;
    };
    if source_meta.modified != replica_meta.modified {
        ctx.log.warning(&format!(
            "副本未能精确保存修改时间，下一轮会再次复制: {}",
            replica.display()
        ));
    }
}

fn replica_kind(ctx: &PassContext<'_>, path: &Path) -> Result<Option<EntryKind>, SyncError> {
    ctx.fs.entry_kind(path).with_op(FsOp::ReadMetadata, path)
}

fn remove_replica_link(
    ctx: &PassContext<'_>,
    path: &Path,
    result: &mut SyncResult,
) -> Result<(), SyncError> {
    ctx.fs.remove_file(path).with_op(FsOp::RemoveFile, path)?;
    result.files_deleted += 1;
    ctx.log.info(&format!("删除副本中的符号链接: {}", path.display()));
    Ok(())
}

/// 确保副本中存在对应子目录，返回下一层目录对
fn ensure_replica_dir(
    ctx: &PassContext<'_>,
    pair: &DirectoryPair,
    name: &OsStr,
    result: &mut SyncResult,
) -> Result<DirectoryPair, SyncError> {
    let child = pair.child(name);

    match replica_kind(ctx, &child.replica)? {
        Some(EntryKind::Dir) => return Ok(child),
        // 副本中同名条目是文件，先删除
        Some(EntryKind::File) => {
            ctx.remove_replica_file(&child.replica)?;
            result.files_deleted += 1;
            ctx.log.info(&format!(
                "删除与源目录同名的文件: {}",
                child.replica.display()
            ));
        }
        // 指向目录的链接也不能当作副本目录，否则会写到副本之外
        Some(EntryKind::Symlink) => remove_replica_link(ctx, &child.replica, result)?,
        None => {}
    }

    ctx.fs
        .create_dir(&child.replica)
        .with_op(FsOp::CreateDir, &child.replica)?;
    result.directories_created += 1;
    ctx.log.info(&format!("创建目录: {}", child.replica.display()));

    Ok(child)
}
