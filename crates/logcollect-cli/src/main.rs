use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use logcollect_core::{
    is_readable_file, resolve_log_path, scan_to_writer, ConfigFile, OutputFormat, ScanConfig, ScanError, ScanRequest,
};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{error, info};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "logcollect", version, about = "从日志文件末尾检索最近的日志行")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 公共配置参数；命令行优先，其次环境变量，再次配置文件
#[derive(clap::Args, Debug)]
struct ConfigArgs {
    /// 日志根目录
    #[arg(long, env = "LC_VAR_LOG_DIR")]
    root: Option<PathBuf>,

    /// 单次扫描最多检查的行数
    #[arg(long, env = "LC_MAX_RESULT_LINES")]
    max_lines: Option<u64>,

    /// 单次扫描最多向后移动的字节数（缺省为行数上限 × 1 MiB）
    #[arg(long, env = "LC_MAX_SCAN_SIZE_BYTES")]
    max_bytes: Option<u64>,

    /// 块大小（字节）
    #[arg(long, env = "LC_BLOCK_SIZE")]
    block_size: Option<usize>,

    /// 配置文件路径（TOML）
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 反向检索日志文件，最新的行最先输出
    Scan {
        /// 相对于日志根目录的文件路径，例如 syslog/syslog.log
        path: String,

        /// 检索关键字（区分大小写的子串）
        #[arg(long)]
        keyword: Option<String>,

        /// 最多返回的命中行数（1-1000）
        #[arg(short = 'n', long = "limit")]
        max_matches: Option<u64>,

        /// 输出格式：text 或 json
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,

        #[command(flatten)]
        cfg: ConfigArgs,
    },
    /// 检查日志文件是否存在且可读
    Check {
        path: String,

        #[command(flatten)]
        cfg: ConfigArgs,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { path, keyword, max_matches, format, cfg } => {
            let config = build_config(&cfg)?;
            let file = resolve_log_path(&config.log_root, &path)?;
            let request = ScanRequest::validated(&file, keyword.as_deref(), max_matches, &config)?;
            if !is_readable_file(&file) {
                error!(path = %file.display(), "log file not found");
                return Err(ScanError::NotFound(file).into());
            }
            info!(path = %file.display(), keyword = ?request.keyword, max_matches = request.max_matches, "starting scan");

            let format = match format.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Text,
            };
            // stdout 只承载检索结果，日志走 stderr
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            // 最终统计由扫描器在结束时记录
            scan_to_writer(&request, &config, &mut out, format).context("scan failed")?;
        }
        Commands::Check { path, cfg } => {
            let config = build_config(&cfg)?;
            let file = resolve_log_path(&config.log_root, &path)?;
            if !is_readable_file(&file) {
                bail!(ScanError::NotFound(file));
            }
            println!("ok");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 组装扫描配置：默认值 → 配置文件 → 环境变量/命令行
///
/// 命令行值先合并为一层覆盖，再整体叠加；字节上限只在各层都缺省时才按行数推导。
fn build_config(args: &ConfigArgs) -> Result<ScanConfig> {
    let file = match &args.config {
        Some(p) => ConfigFile::load(p).with_context(|| format!("load config {}", p.display()))?,
        None => ConfigFile::default(),
    };
    let overrides = ConfigFile {
        block_size: args.block_size,
        max_lines_scanned: args.max_lines,
        max_bytes_scanned: args.max_bytes,
        log_root: args.root.clone(),
    };
    file.overridden_by(overrides).into_config().context("invalid scan limits")
}
