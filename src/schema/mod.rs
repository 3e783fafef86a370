// schema/mod.rs - Schema 定义模块
//! 定义索引的 Schema 结构和文档类型
//!
//! Schema 是静态的五个字段，见 [`build_schema`]。

mod document;
pub mod fields;

pub use document::*;
pub use fields::*;

use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, SchemaBuilder, TextFieldIndexing,
    TextOptions, Value,
};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};
use tantivy::{Index, TantivyDocument};
use tantivy_jieba::JiebaTokenizer;

use crate::config::TokenizerKind;

/// 创建索引 Schema
///
/// - `basename`: 分词 + 存储
/// - `dirname` / `path`: 精确匹配 + 存储
/// - `content`: 分词，不存储
/// - `time`: 只存储
pub fn build_schema() -> Schema {
    let mut schema_builder = SchemaBuilder::default();

    let indexing = TextFieldIndexing::default()
        .set_tokenizer(TEXT_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);

    schema_builder.add_text_field(
        FIELD_BASENAME,
        TextOptions::default()
            .set_indexing_options(indexing.clone())
            .set_stored(),
    );
    schema_builder.add_text_field(FIELD_DIRNAME, STRING | STORED);
    schema_builder.add_text_field(FIELD_PATH, STRING | STORED);
    schema_builder.add_text_field(
        FIELD_CONTENT,
        TextOptions::default().set_indexing_options(indexing),
    );
    schema_builder.add_u64_field(FIELD_TIME, STORED);

    schema_builder.build()
}

/// 注册分词器到索引
pub fn register_tokenizers(index: &Index, kind: TokenizerKind) {
    let analyzer = match kind {
        TokenizerKind::Default => TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(40))
            .filter(LowerCaser)
            .build(),
        TokenizerKind::Jieba => TextAnalyzer::builder(JiebaTokenizer {})
            .filter(LowerCaser)
            .build(),
    };
    index.tokenizers().register(TEXT_TOKENIZER, analyzer);
}

/// 预先解析好的字段句柄
#[derive(Debug, Clone, Copy)]
pub struct IndexFields {
    pub basename: Field,
    pub dirname: Field,
    pub path: Field,
    pub content: Field,
    pub time: Field,
}

impl IndexFields {
    pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
        Ok(Self {
            basename: schema.get_field(FIELD_BASENAME)?,
            dirname: schema.get_field(FIELD_DIRNAME)?,
            path: schema.get_field(FIELD_PATH)?,
            content: schema.get_field(FIELD_CONTENT)?,
            time: schema.get_field(FIELD_TIME)?,
        })
    }

    /// 转换为 Tantivy 文档
    pub fn to_tantivy_doc(&self, doc: &IndexedDocument) -> TantivyDocument {
        let mut tantivy_doc = TantivyDocument::new();
        tantivy_doc.add_text(self.basename, &doc.basename);
        tantivy_doc.add_text(self.dirname, &doc.dirname);
        tantivy_doc.add_text(self.path, &doc.path);
        tantivy_doc.add_text(self.content, &doc.content);
        tantivy_doc.add_u64(self.time, doc.time);
        tantivy_doc
    }

    /// 读取存储的 (path, time)，缺少 path 的文档返回 None
    pub fn stamp_of(&self, doc: &TantivyDocument) -> Option<(String, u64)> {
        let path = doc.get_first(self.path).and_then(|v| v.as_str())?;
        let time = doc.get_first(self.time).and_then(|v| v.as_u64()).unwrap_or(0);
        Some((path.to_string(), time))
    }

    /// 读取对外可见的摘要字段
    pub fn summary_of(&self, doc: &TantivyDocument) -> DocumentSummary {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };
        DocumentSummary {
            basename: text(self.basename),
            dirname: text(self.dirname),
            path: text(self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_schema_has_all_fields() {
        let schema = build_schema();
        assert_eq!(schema.fields().count(), 5);
        assert!(IndexFields::from_schema(&schema).is_ok());
    }

    #[test]
    fn test_content_is_not_stored() {
        let schema = build_schema();
        let content = schema.get_field(FIELD_CONTENT).unwrap();
        assert!(!schema.get_field_entry(content).is_stored());
        assert!(schema.get_field_entry(content).is_indexed());

        let time = schema.get_field(FIELD_TIME).unwrap();
        assert!(schema.get_field_entry(time).is_stored());
        assert!(!schema.get_field_entry(time).is_indexed());
    }

    #[test]
    fn test_doc_conversion() {
        let fields = IndexFields::from_schema(&build_schema()).unwrap();
        let doc = IndexedDocument {
            basename: "a.ipynb".to_string(),
            dirname: "/work/notes".to_string(),
            path: "/work/notes/a.ipynb".to_string(),
            content: "hello world".to_string(),
            time: 42,
        };

        let tantivy_doc = fields.to_tantivy_doc(&doc);
        assert_eq!(
            fields.stamp_of(&tantivy_doc),
            Some(("/work/notes/a.ipynb".to_string(), 42))
        );
        assert_eq!(fields.summary_of(&tantivy_doc), doc.summary());
    }
}
