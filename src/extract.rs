// extract.rs - 文档提取
//! 把 (路径, 修改时间) 转换成可索引的文档。
//!
//! 只有 notebook 会提取内容，其他文件 content 为空，只能按文件名搜索。
//! 解析失败不会中断索引：文档照常生成，content 留空。

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::config::ExtractConfig;
use crate::schema::IndexedDocument;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notebook JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported notebook format: {0}")]
    Format(String),
}

// ============== notebook 文件格式 ==============

/// 单元格源码：字符串或按行拆分的字符串数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MultilineText {
    Single(String),
    Lines(Vec<String>),
}

impl MultilineText {
    fn into_text(self) -> String {
        match self {
            MultilineText::Single(s) => s,
            MultilineText::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCell {
    #[serde(default)]
    cell_type: Option<String>,
    #[serde(default)]
    source: Option<MultilineText>,
    /// v3 代码单元格
    #[serde(default)]
    input: Option<MultilineText>,
    /// v3 标题单元格
    #[serde(default)]
    level: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawWorksheet {
    #[serde(default)]
    cells: Vec<RawCell>,
}

#[derive(Debug, Deserialize)]
struct RawNotebook {
    #[serde(default)]
    nbformat: Option<u32>,
    #[serde(default)]
    cells: Option<Vec<RawCell>>,
    #[serde(default)]
    worksheets: Option<Vec<RawWorksheet>>,
}

impl RawCell {
    /// v4 单元格文本
    fn into_v4_source(self) -> String {
        self.source.map(MultilineText::into_text).unwrap_or_default()
    }

    /// v3 单元格文本：代码用 input，标题转成 markdown 标题
    fn into_v3_source(self) -> String {
        match self.cell_type.as_deref() {
            Some("code") => self.input.map(MultilineText::into_text).unwrap_or_default(),
            Some("heading") => {
                let level = self.level.unwrap_or(1).max(1);
                let text = self.source.map(MultilineText::into_text).unwrap_or_default();
                format!("{} {}", "#".repeat(level), text)
            }
            _ => self.source.map(MultilineText::into_text).unwrap_or_default(),
        }
    }
}

/// 解析 notebook JSON，按单元格顺序用换行拼接源码
pub fn notebook_source(json: &str) -> Result<String, ExtractError> {
    let notebook: RawNotebook = serde_json::from_str(json)?;

    let sources: Vec<String> = match (notebook.nbformat, notebook.cells, notebook.worksheets) {
        (Some(3), _, Some(worksheets)) => worksheets
            .into_iter()
            .flat_map(|ws| ws.cells)
            .map(RawCell::into_v3_source)
            .collect(),
        (Some(4) | None, Some(cells), _) => cells.into_iter().map(RawCell::into_v4_source).collect(),
        (version, _, _) => {
            return Err(ExtractError::Format(format!("nbformat {:?}", version)));
        }
    };

    Ok(sources.join("\n"))
}

// ============== 提取器 ==============

/// 文档提取器
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    notebook_extensions: Vec<String>,
}

impl DocumentExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            notebook_extensions: config
                .notebook_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// 检查是否按 notebook 解析
    pub fn is_notebook(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .is_some_and(|ext| self.notebook_extensions.iter().any(|e| *e == ext))
    }

    /// 生成索引文档；内容提取失败时 content 为空
    pub fn extract(&self, path: &str, time: u64) -> IndexedDocument {
        let content = if self.is_notebook(Path::new(path)) {
            self.read_notebook(Path::new(path)).unwrap_or_else(|e| {
                warn!(path = %path, error = %e, "notebook content not extracted");
                String::new()
            })
        } else {
            String::new()
        };

        IndexedDocument::new(path, content, time)
    }

    fn read_notebook(&self, path: &Path) -> Result<String, ExtractError> {
        let json = fs::read_to_string(path)?;
        notebook_source(&json)
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new(&ExtractConfig::default())
    }
}
