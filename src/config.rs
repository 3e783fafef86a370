// 配置模块 - 支持外部配置文件
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub const CONFIG_FILE: &str = "./config.toml";

/// 索引目录在用户数据目录下的相对位置
const DATA_DIR_NAME: &str = "notebook-search";
const INDEX_DIR_NAME: &str = "index";

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============== 配置结构体 ==============

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub scanner: ScannerConfig,
    pub extract: ExtractConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    /// 索引目录，None 表示使用用户数据目录
    pub path: Option<PathBuf>,
    /// IndexWriter 内存预算（字节）
    pub writer_memory: usize,
    /// 文本字段使用的分词器
    pub tokenizer: TokenizerKind,
}

/// 文本字段分词器
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// tantivy 默认分词（按非字母数字切分 + 小写）
    #[default]
    Default,
    /// 结巴中文分词 + 小写
    Jieba,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    /// 以此前缀开头的文件和目录被跳过（目录连同整个子树）
    pub hidden_prefix: String,
    /// 是否跟随符号链接
    pub follow_symlinks: bool,
    /// 最大遍历深度 (0 表示无限制)
    pub max_depth: usize,
    /// 额外的排除模式，按条目名匹配
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExtractConfig {
    /// 被视为 notebook 的扩展名（不含点号，大小写不敏感）
    pub notebook_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// basename 字段相对 content/dirname 的权重
    pub basename_boost: f32,
    /// 默认返回结果数量
    pub default_limit: usize,
    /// 多个词之间默认为 AND
    pub conjunction: bool,
}

// ============== 默认配置 ==============

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: None,
            writer_memory: 50_000_000,
            tokenizer: TokenizerKind::Default,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            hidden_prefix: ".".to_string(),
            follow_symlinks: true,
            max_depth: 0,
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            notebook_extensions: vec!["ipynb".to_string()],
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            basename_boost: 5.0,
            default_limit: 25,
            conjunction: true,
        }
    }
}

// ============== 配置加载 ==============

impl AppConfig {
    /// 从配置文件加载，失败则使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self::load_from_file(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "config not loaded, using defaults");
            Self::default()
        })
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 生成默认配置文件
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let default_content = include_str!("../config.toml");
        fs::write(path, default_content)?;
        Ok(())
    }

    /// 指定索引目录（测试和嵌入场景使用）
    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index.path = Some(path.into());
        self
    }
}

impl IndexConfig {
    /// 实际使用的索引目录
    pub fn index_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => default_index_path(),
        }
    }
}

/// 用户数据目录下的默认索引位置；取不到数据目录时退回当前目录
pub fn default_index_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
        .join(INDEX_DIR_NAME)
}
