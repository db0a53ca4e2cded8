use crate::core::CompareMode;
use serde::Serialize;
use uuid::Uuid;

/// 一轮同步的计数结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub files_copied: u64,
    pub files_updated: u64,
    pub files_deleted: u64,
    pub directories_created: u64,
    pub directories_deleted: u64,
    pub errors_encountered: u64,
}

impl SyncResult {
    /// 本轮对副本做出的修改数
    pub fn total_changes(&self) -> u64 {
        self.files_copied
            + self.files_updated
            + self.files_deleted
            + self.directories_created
            + self.directories_deleted
    }

    pub fn has_errors(&self) -> bool {
        self.errors_encountered > 0
    }

    /// 没有修改也没有错误
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for SyncResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "新增 {} 个文件, 更新 {} 个文件, 删除 {} 个文件, 创建 {} 个目录, 删除 {} 个目录, {} 个错误",
            self.files_copied,
            self.files_updated,
            self.files_deleted,
            self.directories_created,
            self.directories_deleted,
            self.errors_encountered
        )
    }
}

/// 同步报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub pass_id: Uuid,
    /// 开始时间（Unix 时间戳）
    pub start_time: i64,
    pub end_time: i64,
    /// 耗时（毫秒）
    pub duration_ms: u64,
    pub mode: CompareMode,
    pub result: SyncResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let result = SyncResult {
            files_copied: 2,
            files_updated: 1,
            files_deleted: 3,
            directories_created: 1,
            directories_deleted: 1,
            errors_encountered: 0,
        };
        assert_eq!(result.total_changes(), 8);
        assert!(!result.has_errors());
        assert!(!result.is_noop());
        assert!(SyncResult::default().is_noop());
    }

    #[test]
    fn test_serialize_camel_case() {
        let result = SyncResult {
            errors_encountered: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["errorsEncountered"], 1);
        assert_eq!(json["filesCopied"], 0);
    }
}
