//! `ta-grader` 命令行入口
//!
//! - `grade`: 按评分标准批改一个 ZIP 作业包
//! - `relay`: 启动持有上游令牌的中转服务

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ta_grader::config::{Config, GatewayKind};
use ta_grader::relay::{self, RelayState};
use ta_grader::utils::logging;
use ta_grader::{App, GradeJob};

#[derive(Parser)]
#[command(name = "ta-grader")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rubric-based batch grading of student submissions", long_about = None)]
struct Cli {
    /// TOML config file (environment variables and command-line flags take precedence)
    #[arg(short, long, global = true, env = "GRADER_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade every .txt submission in a ZIP archive
    Grade {
        /// Class name shown in the prompt and the summary title
        #[arg(long = "class")]
        class_name: String,

        /// Rubric CSV (first line holds the category names)
        #[arg(long)]
        rubric: PathBuf,

        /// ZIP archive of .txt submissions
        #[arg(long)]
        archive: PathBuf,

        /// Output directory for reports
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Model gateway: relay, openai or huggingface
        #[arg(long, value_parser = parse_gateway)]
        gateway: Option<GatewayKind>,

        /// Maximum number of submissions graded at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Run the relay server that forwards prompts to the hosted model
    Relay {
        /// Listen address, e.g. 127.0.0.1:8787
        #[arg(long)]
        bind: Option<String>,
    },
}

fn parse_gateway(s: &str) -> Result<GatewayKind, String> {
    GatewayKind::parse(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    match cli.command {
        Commands::Grade {
            class_name,
            rubric,
            archive,
            out,
            gateway,
            concurrency,
        } => {
            if let Some(gateway) = gateway {
                config.gateway = gateway;
            }
            if let Some(concurrency) = concurrency {
                config.max_concurrent_submissions = concurrency;
            }

            let job = GradeJob {
                class_name,
                rubric_path: rubric,
                archive_path: archive,
                output_dir: out,
            };

            // 初始化并运行应用
            App::initialize(config).await?.run(job).await?;
        }
        Commands::Relay { bind } => {
            let addr = bind.unwrap_or_else(|| config.relay_bind_addr.clone());
            let state = RelayState::from_config(&config)?;
            relay::serve(&addr, state).await?;
        }
    }

    Ok(())
}
