use anyhow::{Context, Result};
/// 日志工具模块
///
/// 订阅器初始化，以及批量评分过程中的日志格式化辅助函数
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 `debug` 或 `info`。
/// 重复调用是安全的（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `class_name`: 课程名称
pub fn init_log_file(log_file_path: &Path, class_name: &str) -> Result<()> {
    let log_header = format!(
        "{}\n评分日志 - {} - {}\n{}\n\n",
        "=".repeat(60),
        class_name,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `class_name`: 课程名称
/// - `max_concurrent`: 最大并发数
pub fn log_startup(class_name: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量评分模式");
    info!("📚 课程: {}", class_name);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录作业加载信息
pub fn log_submissions_loaded(total: usize, categories: usize) {
    info!("✓ 找到 {} 份待评分的作业", total);
    info!("📋 评分标准共 {} 个类别", categories);
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `pending`: 待处理（失败）数量
/// - `output_dir`: 报告输出目录
pub fn print_final_stats(success: usize, pending: usize, output_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部评分完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, success + pending);
    info!("⏳ 待处理: {}", pending);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", output_dir.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
