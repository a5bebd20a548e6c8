//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 manga-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `save-check`: 检查存档文件（版本、链接、资源引用）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use manga_runtime::{Book, DiagnosticResult, analyze_book, extract_resource_references};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

fn ensure_cargo_llvm_cov_available(sh: &Shell) -> anyhow::Result<()> {
    if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_ok() {
        return Ok(());
    }
    anyhow::bail!(
        "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
    )
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());
    let sh = Shell::new()?;

    match sub.as_str() {
        "check-all" => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;
            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;
            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available(&sh)?;
            cmd!(sh, "cargo llvm-cov -p manga-runtime --all-features --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available(&sh)?;

            // 排除工具 crate，只看运行时的覆盖率趋势
            cmd!(
                sh,
                "cargo llvm-cov --workspace --exclude xtask --exclude book-cli --all-features --html"
            )
            .run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "save-check" => {
            let mut path = None;
            let mut json = false;
            for arg in args {
                match arg.as_str() {
                    "--json" => json = true,
                    _ => path = Some(arg),
                }
            }
            save_check(path.as_deref(), json)?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 manga-runtime 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  save-check      检查存档文件

SAVE-CHECK:
  cargo xtask save-check [path] [--json]

  不带参数：检查 assets/books/ 下所有 .save 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - 存档版本是否兼容
    - 页面链接是否能解析
    - 资源文件是否存在（页面图、分格、NPC、物品、音效）
"#
    );
}

//=============================================================================
// save-check 命令实现
//=============================================================================

/// 存档检查配置
struct SaveCheckConfig {
    /// 存档目录（相对于 workspace root）
    books_dir: PathBuf,
    /// 资源根目录（相对于 workspace root）
    assets_root: PathBuf,
}

impl Default for SaveCheckConfig {
    fn default() -> Self {
        Self {
            books_dir: PathBuf::from("assets/books"),
            assets_root: PathBuf::from("assets"),
        }
    }
}

#[derive(Default)]
struct SaveCheckResult {
    books_checked: usize,
    /// 无法读取或版本不兼容
    load_errors: usize,
    diagnostics: DiagnosticResult,
    missing_resources: Vec<MissingResource>,
}

#[derive(serde::Serialize)]
struct MissingResource {
    book: String,
    owner: String,
    resource_type: String,
    path: String,
}

fn save_check(path: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = SaveCheckConfig::default();

    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if !path.exists() {
                anyhow::bail!("路径不存在: {}", p);
            }
            collect_save_files(&path)
        }
        None => {
            if !config.books_dir.exists() {
                anyhow::bail!(
                    "默认存档目录不存在: {}\n请在 workspace 根目录运行，或指定存档路径",
                    config.books_dir.display()
                );
            }
            collect_save_files(&config.books_dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到存档文件（.save）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个存档文件...\n", files.len());

    let mut result = SaveCheckResult::default();
    for file in &files {
        check_save_file(file, &config, &mut result);
    }

    if json {
        let report = serde_json::json!({
            "books": result.books_checked,
            "load_errors": result.load_errors,
            "diagnostics": result.diagnostics,
            "missing_resources": result.missing_resources,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_check_result(&result);
    }

    if result.load_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("存档检查发现错误");
    }

    Ok(())
}

/// 收集路径下的所有存档文件
fn collect_save_files(path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "save"))
        .collect();
    files.sort();
    files
}

fn check_save_file(file: &Path, config: &SaveCheckConfig, result: &mut SaveCheckResult) {
    let name = file.display().to_string();
    result.books_checked += 1;

    let blob = match std::fs::read_to_string(file) {
        Ok(blob) => blob,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", name, e);
            result.load_errors += 1;
            return;
        }
    };

    let mut book = Book::default();
    if let Err(e) = book.load(&blob) {
        eprintln!("[ERROR] {}: {}", name, e);
        result.load_errors += 1;
        return;
    }

    result.diagnostics.merge(analyze_book(&book));

    for r in extract_resource_references(&book) {
        if !config.assets_root.join(&r.path).exists() {
            result.missing_resources.push(MissingResource {
                book: name.clone(),
                owner: r.owner,
                resource_type: r.resource_type.to_string(),
                path: r.path,
            });
        }
    }
}

fn print_check_result(result: &SaveCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个存档", result.books_checked);
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    for mr in &result.missing_resources {
        eprintln!(
            "[WARN] {} ({}): 资源不存在 [{}] {}",
            mr.book, mr.owner, mr.resource_type, mr.path
        );
    }

    let error_count = result.load_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count() + result.missing_resources.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
