// service.rs - 对外入口
//! 持有索引存储和各组件的显式句柄，由启动服务的一方创建并传递，没有全局状态。
//!
//! 对外只有三个操作：同步、搜索、重置。[`NotebookIndex::handle`] 是给 HTTP 层用的适配，
//! 按请求的 reindex 决定搜索前是否先同步。

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::debug;

use crate::api::{SearchRequest, SearchResponse};
use crate::config::AppConfig;
use crate::engine::{IndexError, IndexStats, IndexStore};
use crate::extract::DocumentExtractor;
use crate::scanner::{DirectoryScanner, ScanError};
use crate::search::{QueryEngine, QueryError};
use crate::sync::{SyncEngine, SyncError, SyncOutcome};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// 错误归类，HTTP 层据此选择 4xx / 5xx
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
}

impl ServiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ServiceError::Query(QueryError::Parse(_)) => ErrorClass::Client,
            _ => ErrorClass::Server,
        }
    }
}

/// notebook 搜索索引
pub struct NotebookIndex {
    store: IndexStore,
    sync: SyncEngine,
    query: QueryEngine,
    root: PathBuf,
    default_limit: usize,
}

impl NotebookIndex {
    /// 打开（或创建）索引；root 是 handle 使用的工作目录
    pub fn open(config: &AppConfig, root: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let scanner = DirectoryScanner::new(&config.scanner)?;
        let extractor = DocumentExtractor::new(&config.extract);
        let store = IndexStore::open_or_create(&config.index)?;

        Ok(Self {
            store,
            sync: SyncEngine::new(scanner, extractor),
            query: QueryEngine::new(&config.search),
            root: root.into(),
            default_limit: config.search.default_limit,
        })
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// 让索引与 root 下的磁盘状态一致；写锁被占用时返回 WriteUnavailable
    pub fn synchronize(&self, root: &Path) -> Result<SyncOutcome, SyncError> {
        self.sync.synchronize(&self.store, root)
    }

    /// 搜索；limit 缺省为配置值，locality 缺省为当前工作目录
    pub fn search(
        &self,
        query_text: &str,
        limit: Option<usize>,
        locality_path: Option<&Path>,
    ) -> Result<SearchResponse, QueryError> {
        let start = Instant::now();
        let limit = limit.unwrap_or(self.default_limit);
        let cwd;
        let locality = match locality_path {
            Some(path) => path,
            None => {
                cwd = std::env::current_dir().unwrap_or_else(|e| {
                    debug!(
                        error = %e,
                        root = %self.root.display(),
                        "no current dir, locality falls back to root"
                    );
                    self.root.clone()
                });
                cwd.as_path()
            }
        };

        let response = self.query.search(&self.store, query_text, limit, locality)?;
        Ok(response.with_took(start.elapsed().as_millis() as u64))
    }

    /// 清空索引
    pub fn reset(&self) -> Result<(), IndexError> {
        self.store.reset()
    }

    pub fn stats(&self) -> Result<IndexStats, IndexError> {
        self.store.stats()
    }

    /// 处理一次搜索请求
    pub fn handle(&self, request: &SearchRequest) -> Result<SearchResponse, ServiceError> {
        if request.reindex {
            self.synchronize(&self.root)?;
        }
        let response = self.search(
            &request.query,
            request.limit,
            request.locality_path.as_deref(),
        )?;
        Ok(response)
    }
}
