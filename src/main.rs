// main.rs
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use notebook_search::config::{AppConfig, CONFIG_FILE};
use notebook_search::{NotebookIndex, SearchRequest, SyncOutcome};

#[derive(Parser)]
#[command(name = "notebook-search")]
#[command(about = "Incremental full-text search over a notebook directory")]
#[command(version)]
struct Cli {
    /// 要索引的根目录
    #[arg(default_value = ".")]
    root: PathBuf,

    /// 配置文件路径
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// 启动前清空索引
    #[arg(long)]
    reset: bool,

    /// 写出默认配置文件后退出
    #[arg(long)]
    init_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if cli.init_config {
        AppConfig::write_default(&cli.config)
            .with_context(|| format!("writing {}", cli.config.display()))?;
        println!("已生成配置文件: {}", cli.config.display());
        return Ok(());
    }

    let config = AppConfig::load_or_default(&cli.config);
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("invalid root {}", cli.root.display()))?;

    // 1. 打开索引
    let index = NotebookIndex::open(&config, &root).context("opening index")?;
    if cli.reset {
        index.reset().context("resetting index")?;
    }

    // 2. 初始同步
    match index.synchronize(&root)? {
        SyncOutcome::Applied(stats) => println!(
            " [同步] 新增 {} / 删除 {} / 更新 {} / 未变 {}",
            stats.added, stats.removed, stats.updated, stats.unchanged
        ),
        SyncOutcome::WriteUnavailable => println!(" [同步] 索引正被其他进程写入，跳过"),
    }

    println!("--- notebook 搜索 ---");
    println!(" [目录] {}", root.display());
    println!(" [索引] {}", index.store().path().display());
    println!(" [前台] 输入关键词进行搜索 (输入 'quit' 退出)");

    // 3. 主循环：每次搜索前先同步，以 root 为加分目录
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input == "quit" || input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let request = SearchRequest::new(input).with_locality(&root);
        match index.handle(&request) {
            Ok(response) => {
                println!("共 {} 条匹配 ({}ms)", response.total, response.took_ms);
                for result in &response.results {
                    println!("  {}    {}", result.basename, result.dirname);
                }
                if response.has_more() {
                    println!("  ...");
                }
            }
            Err(e) => println!("搜索出错: {}", e),
        }
    }

    Ok(())
}
