//! 周期同步调度
//!
//! 每一轮同步都在阻塞线程池中完整执行，停止信号只在两轮之间检查。

use crate::core::{CompareMode, PassReport, SyncEngine};
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("上一轮同步尚未结束，跳过本轮")]
    PassInProgress,
    #[error("同步任务异常退出: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// 同步任务：源、副本和比较模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassJob {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub mode: CompareMode,
}

/// 周期同步调度器
pub struct PassScheduler {
    engine: SyncEngine,
    job: Arc<PassJob>,
    interval: Duration,
    /// 是否有一轮正在执行
    running: Arc<AtomicBool>,
}

impl PassScheduler {
    pub fn new(engine: SyncEngine, job: PassJob, interval: Duration) -> Self {
        Self {
            engine,
            job: Arc::new(job),
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 执行一轮同步；已有一轮在执行时立即返回 PassInProgress
    pub async fn run_once(&self) -> Result<PassReport, SchedulerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SchedulerError::PassInProgress);
        }

        let running = self.running.clone();
        let engine = self.engine.clone();
        let job = self.job.clone();

        // 标志在阻塞任务内部复位：即使调用方放弃等待，也要等这一轮真正结束
        let report = tokio::task::spawn_blocking(move || {
            scopeguard::defer! {
                running.store(false, Ordering::SeqCst);
            }
            engine.run_pass(&job.source, &job.replica, job.mode)
        })
        .await?;

        Ok(report)
    }

    /// 按固定间隔重复同步，直到 shutdown 完成；返回完成的轮数
    pub async fn run_until<S, F>(&self, shutdown: S, mut on_pass: F) -> u64
    where
        S: Future<Output = ()>,
        F: FnMut(&PassReport),
    {
        let mut ticker = tokio::time::interval(self.interval);
        // 一轮耗时超过间隔时跳过错过的触发，不排队补跑
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut passes = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("收到停止信号，不再开始新的同步");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match self.run_once().await {
                Ok(report) => {
                    passes += 1;
                    on_pass(&report);
                }
                Err(e) => warn!("{}", e),
            }
        }

        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use std::fs;

    fn scheduler(source: &std::path::Path, replica: &std::path::Path) -> PassScheduler {
        let engine = SyncEngine::with_log(Arc::new(MemorySink::new()));
        let job = PassJob {
            source: source.to_path_buf(),
            replica: replica.to_path_buf(),
            mode: CompareMode::MetadataOnly,
        };
        PassScheduler::new(engine, job, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_run_once_resets_flag() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a"), "a").unwrap();

        let scheduler = scheduler(src.path(), dst.path());
        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report.result.files_copied, 1);
        assert!(!scheduler.is_running());

        let report = scheduler.run_once().await.unwrap();
        assert!(report.result.is_noop());
    }

    #[tokio::test]
    async fn test_refuses_overlapping_pass() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let scheduler = scheduler(src.path(), dst.path());

        scheduler.running.store(true, Ordering::SeqCst);
        assert!(matches!(
            scheduler.run_once().await,
            Err(SchedulerError::PassInProgress)
        ));
    }

    #[tokio::test]
    async fn test_stops_between_passes() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a"), "a").unwrap();
        let scheduler = scheduler(src.path(), dst.path());

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let mut tx = Some(tx);
        let mut results = Vec::new();

        let passes = scheduler
            .run_until(
                async {
                    let _ = rx.await;
                },
                |report| {
                    results.push(report.result);
                    if results.len() == 2 {
                        if let Some(tx) = tx.take() {
                            let _ = tx.send(());
                        }
                    }
                },
            )
            .await;

        assert_eq!(passes, 2);
        assert_eq!(results[0].files_copied, 1);
        assert!(results[1].is_noop());
    }
}
