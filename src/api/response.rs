// api/response.rs - 搜索响应类型
//! 定义搜索结果的结构化响应类型

use serde::{Deserialize, Serialize};

use crate::schema::DocumentSummary;

/// 搜索响应
///
/// 结果是独立的副本，读取事务结束后仍然有效。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// 按得分排序的结果，最多 limit 条
    pub results: Vec<DocumentSummary>,

    /// 截断前的总匹配数
    pub total: usize,

    /// 搜索耗时（毫秒）
    #[serde(default)]
    pub took_ms: u64,
}

impl SearchResponse {
    pub fn new(results: Vec<DocumentSummary>, total: usize) -> Self {
        Self { results, total, took_ms: 0 }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn with_took(mut self, took_ms: u64) -> Self {
        self.took_ms = took_ms;
        self
    }

    /// 截断后是否还有更多结果
    pub fn has_more(&self) -> bool {
        self.total > self.results.len()
    }
}
