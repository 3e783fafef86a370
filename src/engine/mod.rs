// engine/mod.rs - 索引存储层
//! 基于 tantivy 的持久化索引和写事务

pub mod core;
pub mod transaction;

pub use self::core::*;
pub use self::transaction::*;
