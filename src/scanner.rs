// scanner.rs - 磁盘扫描
//! 遍历根目录，生成 路径 -> 修改时间 的快照。
//!
//! 以隐藏前缀开头的条目被跳过，目录则连同整个子树跳过。
//! 遍历期间消失或无法读取的条目直接忽略。

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScannerConfig;
use crate::schema::{Snapshot, stamp_from_system_time};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid scan root {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Invalid exclude pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// 目录扫描器
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    hidden_prefix: String,
    follow_symlinks: bool,
    max_depth: usize,
    exclude: Vec<Pattern>,
}

impl DirectoryScanner {
    pub fn new(config: &ScannerConfig) -> Result<Self, ScanError> {
        let exclude = config
            .exclude_patterns
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            hidden_prefix: config.hidden_prefix.clone(),
            follow_symlinks: config.follow_symlinks,
            max_depth: config.max_depth,
            exclude,
        })
    }

    /// 扫描 root 下所有普通文件
    ///
    /// 根目录不存在或不是目录时返回错误，而不是空快照。
    pub fn scan(&self, root: &Path) -> Result<Snapshot, ScanError> {
        let root = root.canonicalize().map_err(|e| ScanError::InvalidRoot {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !root.is_dir() {
            return Err(ScanError::InvalidRoot {
                path: root,
                reason: "not a directory".to_string(),
            });
        }

        let mut walker = WalkDir::new(&root).follow_links(self.follow_symlinks);
        if self.max_depth > 0 {
            walker = walker.max_depth(self.max_depth);
        }

        let mut snapshot = Snapshot::new();
        let entries = walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped(e));

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if let Some(ancestor) = err.loop_ancestor() {
                        warn!(ancestor = %ancestor.display(), "symlink loop skipped");
                    } else {
                        debug!(error = %err, "entry skipped");
                    }
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let modified = match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(modified)) => modified,
                Ok(Err(err)) => {
                    debug!(path = %entry.path().display(), error = %err, "no mtime, skipped");
                    continue;
                }
                Err(err) => {
                    debug!(path = %entry.path().display(), error = %err, "stat failed, skipped");
                    continue;
                }
            };

            let Some(path) = entry.path().to_str() else {
                debug!(path = %entry.path().display(), "non UTF-8 path skipped");
                continue;
            };

            snapshot.insert(path.to_string(), stamp_from_system_time(modified));
        }

        debug!(root = %root.display(), files = snapshot.len(), "disk scanned");
        Ok(snapshot)
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        if !self.hidden_prefix.is_empty() && name.starts_with(&self.hidden_prefix) {
            return true;
        }
        self.exclude.iter().any(|p| p.matches(&name))
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self {
            hidden_prefix: ".".to_string(),
            follow_symlinks: true,
            max_depth: 0,
            exclude: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    fn key(path: &Path) -> String {
        path.canonicalize().unwrap().to_string_lossy().to_string()
    }

    #[test]
    fn test_scan_recurses_and_skips_hidden() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.ipynb"));
        touch(&root.join("sub/deeper/b.txt"));
        touch(&root.join(".hidden_file"));
        touch(&root.join(".git/config"));
        touch(&root.join("sub/.ipynb_checkpoints/a-checkpoint.ipynb"));

        let snapshot = DirectoryScanner::default().scan(root).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key(&key(&root.join("a.ipynb"))));
        assert!(snapshot.contains_key(&key(&root.join("sub/deeper/b.txt"))));
        assert!(snapshot.values().all(|t| *t > 0));
    }

    #[test]
    fn test_hidden_root_is_scanned() {
        let dir = tempdir().unwrap();
        let root = dir.path().join(".workspace");
        touch(&root.join("a.txt"));

        let snapshot = DirectoryScanner::default().scan(&root).unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempdir().unwrap();
        let result = DirectoryScanner::default().scan(&dir.path().join("missing"));
        assert!(matches!(result, Err(ScanError::InvalidRoot { .. })));

        let file = dir.path().join("file.txt");
        touch(&file);
        let result = DirectoryScanner::default().scan(&file);
        assert!(matches!(result, Err(ScanError::InvalidRoot { .. })));
    }

    #[test]
    fn test_exclude_patterns_and_depth() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("keep.ipynb"));
        touch(&root.join("debug.log"));
        touch(&root.join("node_modules/pkg/index.js"));
        touch(&root.join("nested/inner.ipynb"));

        let scanner = DirectoryScanner::new(&ScannerConfig {
            exclude_patterns: vec!["*.log".to_string(), "node_modules".to_string()],
            max_depth: 1,
            ..ScannerConfig::default()
        })
        .unwrap();

        let snapshot = scanner.scan(root).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key(&key(&root.join("keep.ipynb"))));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = DirectoryScanner::new(&ScannerConfig {
            exclude_patterns: vec!["[".to_string()],
            ..ScannerConfig::default()
        });
        assert!(matches!(result, Err(ScanError::Pattern(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_terminates() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("sub/a.txt"));
        std::os::unix::fs::symlink(root, root.join("sub/loop")).unwrap();

        let snapshot = DirectoryScanner::default().scan(root).unwrap();
        assert!(snapshot.contains_key(&key(&root.join("sub/a.txt"))));
        assert_eq!(snapshot.len(), 1);
    }
}
