//! # bookctl
//!
//! 漫画书存档的命令行工具：查看摘要、静态检查、生成轻量存档、管理存档槽位。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p book-cli -- inspect book.save
//! cargo run -p book-cli -- check book.save --json
//! cargo run -p book-cli -- strip book.save -o progress.save
//! cargo run -p book-cli -- slots --dir saves list
//! cargo run -p book-cli -- slots --dir saves delete 3
//! ```

mod slots;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use manga_runtime::{
    Book, DiagnosticLevel, SaveBlob, SavedItems, analyze_book, extract_resource_references,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::slots::SaveSlots;

#[derive(Parser)]
#[command(name = "bookctl")]
#[command(about = "漫画书存档工具")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 显示存档摘要
    Inspect {
        /// 存档文件
        file: PathBuf,
    },

    /// 静态检查（有错误时退出码为 1）
    Check {
        /// 存档文件
        file: PathBuf,

        /// 以 JSON 输出诊断
        #[arg(long)]
        json: bool,

        /// 只显示不低于该级别的诊断（info / warn / error）
        #[arg(long, default_value = "info")]
        level: String,
    },

    /// 把完整存档转成只含动态状态的轻量存档
    Strip {
        /// 完整存档文件
        file: PathBuf,

        /// 输出文件
        #[arg(short, long)]
        output: PathBuf,
    },

    /// 管理存档槽位
    Slots {
        /// 存档目录
        #[arg(long, default_value = "saves")]
        dir: PathBuf,

        #[command(subcommand)]
        action: SlotAction,
    },
}

#[derive(Subcommand)]
enum SlotAction {
    /// 列出所有槽位
    List,
    /// 删除槽位
    Delete {
        slot: u32,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect { file } => inspect(&file),
        Commands::Check { file, json, level } => check(&file, json, &level),
        Commands::Strip { file, output } => strip(&file, &output),
        Commands::Slots { dir, action } => slots(&dir, action),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_blob(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("无法读取存档文件 {}", path.display()))
}

fn load_book(path: &Path) -> Result<Book> {
    let blob = read_blob(path)?;
    let mut book = Book::default();
    book.load(&blob)
        .with_context(|| format!("无法加载存档 {}", path.display()))?;
    Ok(book)
}

fn inspect(path: &Path) -> Result<ExitCode> {
    let blob = SaveBlob::parse(&read_blob(path)?)?;
    let book = load_book(path)?;

    println!("📖 {}", path.display());
    println!("  版本:       {}", blob.version);
    println!(
        "  类型:       {}",
        if blob.state_only { "轻量存档" } else { "完整存档" }
    );
    println!("  来源模式:   {:?}", blob.sourcing);
    println!("  当前页:     {}", display_id(&blob.current_page_id));
    println!("  上一页:     {}", display_id(&blob.last_page_id));
    println!("  章节:       {}", book.graph.chapters().len());
    println!("  页面:       {}", book.graph.pages().count());
    let items = match &blob.items {
        SavedItems::Full(items) => items.len(),
        SavedItems::StateOnly(states) => states.len(),
    };
    println!(
        "  物品:       {} （携带 {}）",
        items,
        book.inventory.carried().count()
    );
    println!(
        "  笔记:       {} / {}",
        book.notebook.discovered().count(),
        book.notebook.entries.len()
    );
    println!("  状态键:     {}", book.state.len());
    println!("  资源引用:   {}", extract_resource_references(&book).len());
    Ok(ExitCode::SUCCESS)
}

fn display_id(id: &str) -> &str {
    if id.is_empty() { "-" } else { id }
}

fn parse_level(level: &str) -> Result<DiagnosticLevel> {
    match level.to_ascii_lowercase().as_str() {
        "info" => Ok(DiagnosticLevel::Info),
        "warn" => Ok(DiagnosticLevel::Warn),
        "error" => Ok(DiagnosticLevel::Error),
        other => bail!("未知的诊断级别: {other}"),
    }
}

fn check(path: &Path, json: bool, level: &str) -> Result<ExitCode> {
    let min_level = parse_level(level)?;
    let book = load_book(path)?;
    let result = analyze_book(&book);
    let shown = result.filter_by_level(min_level);
    debug!(total = result.diagnostics.len(), shown = shown.len(), "检查完成");

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        for diagnostic in &shown {
            println!("{diagnostic}");
        }
        println!(
            "{} 个错误，{} 个警告",
            result.error_count(),
            result.warn_count()
        );
    }

    Ok(if result.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn strip(path: &Path, output: &Path) -> Result<ExitCode> {
    let book = load_book(path)?;
    let stripped = book.snapshot(true).encode();
    fs::write(output, &stripped)
        .with_context(|| format!("无法写入 {}", output.display()))?;
    println!(
        "✅ 已生成轻量存档 {} （{} 字节 → {} 字节）",
        output.display(),
        read_blob(path)?.len(),
        stripped.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn slots(dir: &Path, action: SlotAction) -> Result<ExitCode> {
    let slots = SaveSlots::new(dir);
    match action {
        SlotAction::List => {
            let saves = slots.list();
            if saves.is_empty() {
                println!("（{} 中没有存档）", dir.display());
            }
            for (slot, path) in saves {
                match slots.info(slot) {
                    Some(info) if info.compatible => println!(
                        "  {slot:03}  v{}  {}  {}",
                        info.version,
                        if info.state_only { "轻量" } else { "完整" },
                        display_id(&info.current_page_id)
                    ),
                    Some(info) => println!("  {slot:03}  v{}  版本不兼容", info.version),
                    None => println!("  {slot:03}  无法读取 {}", path.display()),
                }
            }
        }
        SlotAction::Delete { slot } => {
            if !slots.exists(slot) {
                bail!("槽位 {slot} 不存在");
            }
            slots.delete(slot)?;
            println!("🗑️ 已删除槽位 {slot:03}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
