use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cryptoscan_core::{scan_inputs, DefinitionSet, ScanOptions, ScanReport};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "cryptoscan", version, about = "加密算法关键字扫描器")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描文件或目录，报告命中的算法标识符
    Scan {
        /// 输入路径（文件或目录；目录递归扫描）
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// 定义文件目录（YAML，每个算法族一个文件）
        #[arg(long, default_value = "./definitions")]
        definitions: PathBuf,

        /// 大小写不敏感匹配（ASCII 折叠）
        #[arg(long)]
        ignore_case: bool,

        /// 输出格式：text 或 json
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// 输出文件；缺省写到标准输出
        #[arg(long)]
        output: Option<PathBuf>,

        /// 线程数（"auto"=CPU 核心数；1 为串行）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 最大扫描文件大小（单位字节，超过则跳过）
        #[arg(long)]
        max_file_size: Option<u64>,
    },

    /// 列出加载的算法定义
    List {
        /// 定义文件目录
        #[arg(long, default_value = "./definitions")]
        definitions: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { inputs, definitions, ignore_case, format, output, threads, max_file_size } => {
            info!(?definitions, inputs = inputs.len(), "starting scan");

            // 定义集是扫描的根基：任何加载错误都在启动期中止
            let defs = DefinitionSet::load_dir(&definitions).context("load definitions")?;
            let opts = ScanOptions {
                case_insensitive: ignore_case,
                max_file_size,
                threads: parse_threads(&threads),
            };
            let report = scan_inputs(&inputs, &defs, &opts).context("scan failed")?;

            // 跳过与失败的输入单独提示（与命中报告分开）
            for s in &report.skipped {
                warn!(path = %s.path.display(), reason = %s.reason, "input skipped");
            }
            for f in &report.failures {
                warn!(path = %f.path.display(), error = %f.error, "input failed");
            }

            match output {
                Some(path) => {
                    let mut out = BufWriter::new(File::create(&path).context("create output file")?);
                    render(&report, &format, &mut out)?;
                    out.flush().ok();
                }
                None => {
                    let stdout = std::io::stdout();
                    let mut out = stdout.lock();
                    render(&report, &format, &mut out)?;
                }
            }

            info!(
                files_scanned = report.stats.files_scanned,
                matches_total = report.stats.matches_total,
                files_skipped = report.stats.files_skipped,
                files_failed = report.stats.files_failed,
                "scan finished"
            );

            // 批次完成但存在读取失败的输入：退出码 2，与致命错误（1）区分
            if report.has_failures() {
                return Ok(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::List { definitions } => {
            let defs = DefinitionSet::load_dir(&definitions).context("load definitions")?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for def in defs.iter() {
                match &def.name {
                    Some(name) => writeln!(out, "{}\t{} keywords\t{}", def.id, def.keywords.len(), name)?,
                    None => writeln!(out, "{}\t{} keywords", def.id, def.keywords.len())?,
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// 渲染报告
/// - text：每个 (文件, 算法) 命中对一行，随后是跳过/失败的汇总块
/// - json：完整报告结构
fn render(report: &ScanReport, format: &str, out: &mut dyn Write) -> Result<()> {
    match format {
        "json" => {
            serde_json::to_writer_pretty(&mut *out, report).context("write json report")?;
            writeln!(out)?;
        }
        _ => {
            for r in &report.results {
                for algo in &r.algorithms {
                    writeln!(out, "{}: {}", r.path.display(), algo)?;
                }
            }
            if !report.skipped.is_empty() {
                writeln!(out)?;
                writeln!(out, "skipped:")?;
                for s in &report.skipped {
                    writeln!(out, "  {} ({})", s.path.display(), s.reason)?;
                }
            }
            if !report.failures.is_empty() {
                writeln!(out)?;
                writeln!(out, "failed:")?;
                for f in &report.failures {
                    writeln!(out, "  {} ({})", f.path.display(), f.error)?;
                }
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    // 日志写 stderr，保证 stdout 上的报告干净可管道
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
