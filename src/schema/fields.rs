// schema/fields.rs - 字段名常量定义
//! 统一管理所有 Schema 字段名，避免魔法字符串

/// 文件名（含扩展名），分词，权重最高
pub const FIELD_BASENAME: &str = "basename";
/// 父目录路径，精确匹配
pub const FIELD_DIRNAME: &str = "dirname";
/// 完整文件路径，唯一键
pub const FIELD_PATH: &str = "path";
/// 文件内容，只索引不存储
pub const FIELD_CONTENT: &str = "content";
/// 最后修改时间戳，只存储不索引
pub const FIELD_TIME: &str = "time";

/// 文本字段使用的分词器名；具体实现在打开索引时按配置注册
pub const TEXT_TOKENIZER: &str = "notebook_text";
