// engine/core.rs - 索引存储核心
//! 持久化的文档集合，以 path 为唯一键。
//!
//! - 读操作每次先 reload 到最新提交，拿到的 searcher 是快照，不会看到未提交的写入
//! - 写操作通过 [`IndexStore::begin_write`] 获取独占写锁，拿不到立即返回，不等待
//! - [`IndexStore::reset`] 先拿写锁，再删除整个索引目录后重建；有未结束的写事务时拒绝执行

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tantivy::collector::{Count, DocSetCollector};
use tantivy::directory::error::LockError;
use tantivy::directory::{Directory, INDEX_WRITER_LOCK, MmapDirectory};
use tantivy::query::{AllQuery, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, TantivyError, Term,
};
use tracing::{debug, info};

use crate::config::{IndexConfig, TokenizerKind};
use crate::schema::{self, IndexFields, Snapshot};

use super::transaction::IndexTransaction;

/// 索引存储错误类型
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Index is held by an open writer")]
    WriterBusy,
}

pub type IndexResult<T> = Result<T, IndexError>;

/// 获取写权限的结果
///
/// 写锁被占用是并发同步时的正常情况，不作为错误处理。
pub enum WriteAccess {
    Acquired(IndexTransaction),
    Unavailable,
}

impl WriteAccess {
    pub fn is_acquired(&self) -> bool {
        matches!(self, WriteAccess::Acquired(_))
    }
}

/// 打开的索引及其读取器
pub(crate) struct IndexHandle {
    pub(crate) index: Index,
    pub(crate) reader: IndexReader,
    pub(crate) fields: IndexFields,
}

impl IndexHandle {
    fn open(path: &Path, tokenizer: TokenizerKind) -> IndexResult<Self> {
        fs::create_dir_all(path)?;

        let dir = MmapDirectory::open(path).map_err(|e| IndexError::Directory(e.to_string()))?;
        let existed = Index::exists(&dir).map_err(|e| IndexError::Directory(e.to_string()))?;
        let index = Index::open_or_create(dir, schema::build_schema())?;
        schema::register_tokenizers(&index, tokenizer);

        if existed {
            info!(path = %path.display(), "opened existing index");
        } else {
            info!(path = %path.display(), "created new index");
        }

        // 手动 reload：每次读取前刷新到最新提交
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let fields = IndexFields::from_schema(&index.schema())?;

        Ok(Self { index, reader, fields })
    }

    /// 最新已提交状态的快照
    pub(crate) fn searcher(&self) -> IndexResult<Searcher> {
        self.reader.reload()?;
        Ok(self.reader.searcher())
    }
}

/// 索引存储
pub struct IndexStore {
    path: PathBuf,
    tokenizer: TokenizerKind,
    writer_memory: usize,
    handle: RwLock<Arc<IndexHandle>>,
}

impl IndexStore {
    /// 打开已有索引，不存在则按当前 Schema 创建
    pub fn open_or_create(config: &IndexConfig) -> IndexResult<Self> {
        Self::open_at(config.index_path(), config.tokenizer, config.writer_memory)
    }

    pub(crate) fn open_at(
        path: PathBuf,
        tokenizer: TokenizerKind,
        writer_memory: usize,
    ) -> IndexResult<Self> {
        let handle = IndexHandle::open(&path, tokenizer)?;
        Ok(Self {
            path,
            tokenizer,
            writer_memory,
            handle: RwLock::new(Arc::new(handle)),
        })
    }

    /// 索引目录
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn current(&self) -> Arc<IndexHandle> {
        Arc::clone(&self.handle.read())
    }

    /// 删除全部持久化数据并重建空索引，不可恢复
    ///
    /// 写锁被其他事务持有时返回 [`IndexError::WriterBusy`]，索引保持不变。
    pub fn reset(&self) -> IndexResult<()> {
        let mut handle = self.handle.write();

        // 删除和重建期间一直持有旧目录的写锁
        let _writer_lock = match handle.index.directory().acquire_lock(&INDEX_WRITER_LOCK) {
            Ok(lock) => lock,
            Err(LockError::LockBusy) => {
                debug!(path = %self.path.display(), "index writer lock busy, reset refused");
                return Err(IndexError::WriterBusy);
            }
            Err(e) => return Err(IndexError::Directory(e.to_string())),
        };

        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        *handle = Arc::new(IndexHandle::open(&self.path, self.tokenizer)?);
        info!(path = %self.path.display(), "index reset");
        Ok(())
    }

    /// 读取所有已提交文档的 (path, time)
    pub fn enumerate_all(&self) -> IndexResult<Snapshot> {
        let handle = self.current();
        let searcher = handle.searcher()?;

        let addresses = searcher.search(&AllQuery, &DocSetCollector)?;
        let mut snapshot = Snapshot::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some((path, time)) = handle.fields.stamp_of(&doc) {
                snapshot.insert(path, time);
            }
        }

        Ok(snapshot)
    }

    /// 获取独占写权限；已被其他写者持有时立即返回 Unavailable
    pub fn begin_write(&self) -> IndexResult<WriteAccess> {
        // 拿到 writer 之前一直持有读锁，避免与 reset 交错
        let handle = self.handle.read();
        let writer: tantivy::Result<IndexWriter> = handle.index.writer(self.writer_memory);

        match writer {
            Ok(writer) => Ok(WriteAccess::Acquired(IndexTransaction::new(writer, handle.fields))),
            Err(TantivyError::LockFailure(LockError::LockBusy, _)) => {
                debug!(path = %self.path.display(), "index writer lock busy");
                Ok(WriteAccess::Unavailable)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 检查路径是否已索引
    pub fn contains(&self, path: &str) -> IndexResult<bool> {
        let handle = self.current();
        let searcher = handle.searcher()?;
        let term = Term::from_field_text(handle.fields.path, path);
        let query = TermQuery::new(term, IndexRecordOption::Basic);

        let count = searcher.search(&query, &Count)?;
        Ok(count > 0)
    }

    /// 获取索引统计
    pub fn stats(&self) -> IndexResult<IndexStats> {
        let searcher = self.current().searcher()?;

        Ok(IndexStats {
            total_documents: searcher.num_docs() as usize,
            index_size_bytes: self.estimate_index_size()?,
        })
    }

    fn estimate_index_size(&self) -> IndexResult<u64> {
        let mut total_size = 0u64;

        if self.path.exists() {
            for entry in fs::read_dir(&self.path)? {
                let entry = entry?;
                if entry.path().is_file() {
                    total_size += entry.metadata()?.len();
                }
            }
        }

        Ok(total_size)
    }
}

/// 索引统计信息
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub total_documents: usize,
    pub index_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IndexedDocument;
    use tempfile::tempdir;

    fn open(path: &Path) -> IndexStore {
        IndexStore::open_at(path.to_path_buf(), TokenizerKind::Default, 50_000_000).unwrap()
    }

    fn doc(path: &str, content: &str, time: u64) -> IndexedDocument {
        IndexedDocument::new(path, content.to_string(), time)
    }

    fn write(store: &IndexStore, f: impl FnOnce(&mut IndexTransaction)) {
        match store.begin_write().unwrap() {
            WriteAccess::Acquired(mut txn) => {
                f(&mut txn);
                txn.commit().unwrap();
            }
            WriteAccess::Unavailable => panic!("writer lock unexpectedly busy"),
        }
    }

    #[test]
    fn test_open_or_create_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");

        let store = open(&path);
        write(&store, |txn| txn.add(&doc("/w/a.txt", "", 1)).unwrap());
        drop(store);

        let reopened = open(&path);
        assert_eq!(reopened.enumerate_all().unwrap().len(), 1);
        let again = open(&path);
        assert_eq!(again.stats().unwrap().total_documents, 1);
    }

    #[test]
    fn test_uncommitted_writes_are_invisible() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());

        let WriteAccess::Acquired(mut txn) = store.begin_write().unwrap() else {
            panic!("writer lock unexpectedly busy");
        };
        txn.add(&doc("/w/a.txt", "", 1)).unwrap();
        assert!(store.enumerate_all().unwrap().is_empty());

        txn.commit().unwrap();
        assert_eq!(store.enumerate_all().unwrap().len(), 1);
    }

    #[test]
    fn test_dropped_transaction_is_discarded() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());

        if let WriteAccess::Acquired(mut txn) = store.begin_write().unwrap() {
            txn.add(&doc("/w/a.txt", "", 1)).unwrap();
        }
        assert!(store.enumerate_all().unwrap().is_empty());
        assert!(store.begin_write().unwrap().is_acquired());
    }

    #[test]
    fn test_second_writer_is_unavailable() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());

        let held = store.begin_write().unwrap();
        assert!(held.is_acquired());
        assert!(!store.begin_write().unwrap().is_acquired());

        // 同一目录的另一个实例（模拟另一个进程）也拿不到写锁
        let other = open(dir.path());
        assert!(!other.begin_write().unwrap().is_acquired());

        drop(held);
        assert!(store.begin_write().unwrap().is_acquired());
    }

    #[test]
    fn test_update_replaces_by_path() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());

        write(&store, |txn| txn.add(&doc("/w/a.txt", "", 1)).unwrap());
        write(&store, |txn| txn.update(&doc("/w/a.txt", "", 2)).unwrap());

        let snapshot = store.enumerate_all().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["/w/a.txt"], 2);
    }

    #[test]
    fn test_remove_and_contains() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());

        write(&store, |txn| {
            txn.add(&doc("/w/a.txt", "", 1)).unwrap();
            txn.add(&doc("/w/b.txt", "", 1)).unwrap();
        });
        assert!(store.contains("/w/a.txt").unwrap());

        write(&store, |txn| txn.remove("/w/a.txt"));
        assert!(!store.contains("/w/a.txt").unwrap());
        assert!(store.contains("/w/b.txt").unwrap());
    }

    #[test]
    fn test_reset_clears_everything() {
        let dir = tempdir().unwrap();
        let store = open(&dir.path().join("index"));

        write(&store, |txn| txn.add(&doc("/w/a.txt", "", 1)).unwrap());
        store.reset().unwrap();

        assert!(store.enumerate_all().unwrap().is_empty());
        assert!(store.path().exists());
        assert!(store.begin_write().unwrap().is_acquired());
    }

    #[test]
    fn test_reset_refused_while_transaction_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        let store = open(&path);
        write(&store, |txn| txn.add(&doc("/w/a.txt", "", 1)).unwrap());

        let WriteAccess::Acquired(mut txn) = store.begin_write().unwrap() else {
            panic!("writer lock unexpectedly busy");
        };
        assert!(matches!(store.reset(), Err(IndexError::WriterBusy)));
        assert!(!store.begin_write().unwrap().is_acquired());

        // 事务照常提交，索引完好
        txn.add(&doc("/w/b.txt", "", 1)).unwrap();
        txn.commit().unwrap();
        assert_eq!(store.enumerate_all().unwrap().len(), 2);
        assert_eq!(open(&path).enumerate_all().unwrap().len(), 2);

        // 写锁释放后可以重置
        store.reset().unwrap();
        assert!(store.enumerate_all().unwrap().is_empty());
        write(&store, |txn| txn.add(&doc("/w/c.txt", "", 1)).unwrap());
        assert_eq!(open(&path).enumerate_all().unwrap().len(), 1);
    }

    #[test]
    fn test_unopenable_storage_is_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not_a_dir");
        fs::write(&file, "x").unwrap();

        let result = IndexStore::open_at(file, TokenizerKind::Default, 50_000_000);
        assert!(result.is_err());
    }
}
