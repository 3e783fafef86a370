// api/request.rs - 搜索请求类型
//! 调用方（HTTP 层、命令行）传入的搜索参数

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 搜索请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// 原始查询文本
    #[serde(alias = "qs")]
    pub query: String,

    /// 返回结果数量限制，缺省使用配置值
    #[serde(default)]
    pub limit: Option<usize>,

    /// 加分目录，缺省为当前工作目录
    #[serde(default)]
    pub locality_path: Option<PathBuf>,

    /// 搜索前是否先同步索引
    #[serde(default = "default_true")]
    pub reindex: bool,
}

fn default_true() -> bool {
    true
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
            locality_path: None,
            reindex: true,
        }
    }

    pub fn with_locality(mut self, path: impl Into<PathBuf>) -> Self {
        self.locality_path = Some(path.into());
        self
    }

    pub fn with_reindex(mut self, reindex: bool) -> Self {
        self.reindex = reindex;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: SearchRequest = serde_json::from_str(r#"{"qs": "hello"}"#).unwrap();
        assert_eq!(request.query, "hello");
        assert!(request.reindex);
        assert!(request.limit.is_none());
        assert!(request.locality_path.is_none());
    }

    #[test]
    fn test_request_reindex_off() {
        let request: SearchRequest =
            serde_json::from_str(r#"{"query": "x", "reindex": false, "limit": 5}"#).unwrap();
        assert!(!request.reindex);
        assert_eq!(request.limit, Some(5));
    }
}
