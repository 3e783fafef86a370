// engine/transaction.rs - 写事务
//! 持有 IndexWriter（即独占写锁）。所有操作先缓存在 writer 中，
//! 提交时一次性可见；未提交就 drop 则全部丢弃。

use tantivy::{IndexWriter, Term};

use crate::schema::{IndexFields, IndexedDocument};

use super::core::IndexResult;

/// 写事务
pub struct IndexTransaction {
    writer: IndexWriter,
    fields: IndexFields,
}

impl IndexTransaction {
    pub(crate) fn new(writer: IndexWriter, fields: IndexFields) -> Self {
        Self { writer, fields }
    }

    /// 添加新文档
    pub fn add(&mut self, doc: &IndexedDocument) -> IndexResult<()> {
        self.writer.add_document(self.fields.to_tantivy_doc(doc))?;
        Ok(())
    }

    /// 按路径删除
    pub fn remove(&mut self, path: &str) {
        let term = Term::from_field_text(self.fields.path, path);
        self.writer.delete_term(term);
    }

    /// 按路径替换：先删旧的，再写入新的
    pub fn update(&mut self, doc: &IndexedDocument) -> IndexResult<()> {
        self.remove(&doc.path);
        self.add(doc)
    }

    /// 提交并等待合并线程结束，返回后写锁已释放
    pub fn commit(mut self) -> IndexResult<()> {
        self.writer.commit()?;
        self.writer.wait_merging_threads()?;
        Ok(())
    }
}
