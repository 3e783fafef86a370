// search.rs - 查询
//! 多字段自由文本查询，basename 权重最高；
//! 同目录的文档额外加分，但不会排除其他目录的匹配结果。

use std::path::Path;

use tantivy::TantivyDocument;
use tantivy::Term;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, QueryParserError, TermQuery};
use tantivy::schema::IndexRecordOption;

use crate::api::SearchResponse;
use crate::config::SearchConfig;
use crate::engine::{IndexError, IndexStore};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Query parse error: {0}")]
    Parse(#[from] QueryParserError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

impl From<tantivy::TantivyError> for QueryError {
    fn from(e: tantivy::TantivyError) -> Self {
        QueryError::Index(IndexError::Tantivy(e))
    }
}

/// 查询引擎
#[derive(Debug, Clone)]
pub struct QueryEngine {
    basename_boost: f32,
    conjunction: bool,
}

impl QueryEngine {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            basename_boost: config.basename_boost,
            conjunction: config.conjunction,
        }
    }

    /// 执行搜索，返回最多 limit 条结果和截断前的总匹配数
    pub fn search(
        &self,
        store: &IndexStore,
        query_text: &str,
        limit: usize,
        locality_path: &Path,
    ) -> Result<SearchResponse, QueryError> {
        if query_text.trim().is_empty() {
            return Ok(SearchResponse::empty());
        }

        let handle = store.current();
        let fields = handle.fields;

        let mut parser = QueryParser::for_index(
            &handle.index,
            vec![fields.content, fields.basename, fields.dirname],
        );
        parser.set_field_boost(fields.basename, self.basename_boost);
        if self.conjunction {
            parser.set_conjunction_by_default();
        }
        let text_query = parser.parse_query(query_text)?;

        // 同目录加分：Should 子句只影响排序。
        // 索引里的 dirname 来自规范化后的根目录，这里做同样的规范化
        let locality_path = locality_path
            .canonicalize()
            .unwrap_or_else(|_| locality_path.to_path_buf());
        let locality = Term::from_field_text(fields.dirname, &locality_path.to_string_lossy());
        let locality_query: Box<dyn Query> =
            Box::new(TermQuery::new(locality, IndexRecordOption::Basic));
        let query = BooleanQuery::new(vec![
            (Occur::Must, text_query),
            (Occur::Should, locality_query),
        ]);

        let searcher = handle.searcher()?;
        let (top_docs, total) = if limit == 0 {
            (Vec::new(), searcher.search(&query, &Count)?)
        } else {
            searcher.search(&query, &(TopDocs::with_limit(limit), Count))?
        };

        let mut results = Vec::with_capacity(top_docs.len());
        for (_score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            results.push(fields.summary_of(&doc));
        }

        Ok(SearchResponse::new(results, total))
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}
