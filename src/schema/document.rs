// schema/document.rs - 文档结构定义
//! 定义索引文档的结构化表示

use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 快照：绝对路径 -> 修改时间（自 UNIX 纪元起的纳秒数）
pub type Snapshot = HashMap<String, u64>;

/// 索引文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// 文件名（含扩展名）
    pub basename: String,
    /// 父目录路径
    pub dirname: String,
    /// 完整文件路径，文档唯一标识
    pub path: String,
    /// 可搜索的文本内容，不会被存储
    pub content: String,
    /// 最后已知修改时间，仅用于变更检测
    pub time: u64,
}

impl IndexedDocument {
    /// 根据路径字符串推导 basename / dirname
    pub fn new(path: impl Into<String>, content: String, time: u64) -> Self {
        let path = path.into();
        let as_path = Path::new(&path);
        let basename = as_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let dirname = as_path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        Self { basename, dirname, path, content, time }
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            basename: self.basename.clone(),
            dirname: self.dirname.clone(),
            path: self.path.clone(),
        }
    }
}

/// 对外返回的文档摘要，不含 content 和 time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub basename: String,
    pub dirname: String,
    pub path: String,
}

/// 修改时间转为纳秒时间戳；早于纪元的时间记为 0
pub fn stamp_from_system_time(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_derived_names() {
        let doc = IndexedDocument::new("/work/notes/a.ipynb", String::new(), 7);
        assert_eq!(doc.basename, "a.ipynb");
        assert_eq!(doc.dirname, "/work/notes");
        assert_eq!(doc.path, "/work/notes/a.ipynb");
        assert_eq!(doc.time, 7);
    }

    #[test]
    fn test_stamp_from_system_time() {
        let t = SystemTime::UNIX_EPOCH + Duration::new(3, 500);
        assert_eq!(stamp_from_system_time(t), 3_000_000_500);
        assert_eq!(stamp_from_system_time(SystemTime::UNIX_EPOCH), 0);
    }
}
