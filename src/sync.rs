// sync.rs - 增量同步
//! 比较磁盘快照和索引快照，在一个写事务里完成增删改。
//!
//! 修改时间相同就视为内容未变（不做内容哈希），因此同一时间戳下的内容变化不会被发现。
//! 写锁被其他同步占用时，本次同步整体放弃，不重试、不报错，等下一次调用收敛。

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::engine::{IndexError, IndexStore, WriteAccess};
use crate::extract::DocumentExtractor;
use crate::scanner::{DirectoryScanner, ScanError};
use crate::schema::Snapshot;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

/// 三路差异
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// 磁盘上有、索引里没有
    pub to_add: Vec<String>,
    /// 索引里有、磁盘上没有
    pub to_remove: Vec<String>,
    /// 两边都有，时间戳可能不同
    pub to_update: Vec<String>,
}

impl SyncPlan {
    pub fn compute(on_disk: &Snapshot, in_index: &Snapshot) -> Self {
        let disk: HashSet<&String> = on_disk.keys().collect();
        let index: HashSet<&String> = in_index.keys().collect();

        let mut plan = Self {
            to_add: disk.difference(&index).map(|p| p.to_string()).collect(),
            to_remove: index.difference(&disk).map(|p| p.to_string()).collect(),
            to_update: disk.intersection(&index).map(|p| p.to_string()).collect(),
        };
        // 按路径排序，便于日志和测试
        plan.to_add.sort();
        plan.to_remove.sort();
        plan.to_update.sort();
        plan
    }
}

/// 一次同步实际执行的操作数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// 同步结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// 已提交
    Applied(SyncStats),
    /// 写锁被占用，索引未做任何修改
    WriteUnavailable,
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied(_))
    }
}

/// 同步引擎
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    scanner: DirectoryScanner,
    extractor: DocumentExtractor,
}

impl SyncEngine {
    pub fn new(scanner: DirectoryScanner, extractor: DocumentExtractor) -> Self {
        Self { scanner, extractor }
    }

    /// 让索引与 root 下的磁盘状态一致
    pub fn synchronize(&self, store: &IndexStore, root: &Path) -> Result<SyncOutcome, SyncError> {
        let on_disk = self.scanner.scan(root)?;
        let in_index = store.enumerate_all()?;
        let plan = SyncPlan::compute(&on_disk, &in_index);

        let mut txn = match store.begin_write()? {
            WriteAccess::Acquired(txn) => txn,
            WriteAccess::Unavailable => {
                info!(root = %root.display(), "index locked by another writer, sync skipped");
                return Ok(SyncOutcome::WriteUnavailable);
            }
        };

        let mut stats = SyncStats::default();

        // 新增也按路径替换：并发同步的快照可能已过期，保证 path 唯一
        for path in &plan.to_add {
            txn.update(&self.extractor.extract(path, on_disk[path]))?;
            stats.added += 1;
        }

        for path in &plan.to_remove {
            txn.remove(path);
            stats.removed += 1;
        }

        for path in &plan.to_update {
            let disk_time = on_disk[path];
            if disk_time == in_index[path] {
                stats.unchanged += 1;
                continue;
            }
            txn.update(&self.extractor.extract(path, disk_time))?;
            stats.updated += 1;
        }

        txn.commit()?;

        info!(
            root = %root.display(),
            added = stats.added,
            removed = stats.removed,
            updated = stats.updated,
            unchanged = stats.unchanged,
            "index synchronized"
        );
        Ok(SyncOutcome::Applied(stats))
    }
}
