use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::orchestrator::PipelineReport;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 返回是否成功初始化
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题库摄取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 程序配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 流式题库摄取模式");
    info!("📄 输入文件: {}", config.input_file);
    info!("📦 批次大小: {}", config.max_batch_size);
    info!("📊 最大在途批次数: {}", config.max_concurrent_batches);
    info!("{}", "=".repeat(60));
}

/// 打印最终报告
///
/// # 参数
/// - `report`: 流水线最终报告
/// - `config`: 程序配置
pub fn print_final_report(report: &PipelineReport, config: &Config) {
    info!("\n{}", "=".repeat(60));
    if report.cancelled {
        info!("🛑 运行被取消（结果不完整）");
    } else {
        info!("📊 全部处理完成统计");
    }
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 解析成功: {}/{}", report.parsed, report.total_blocks);
    info!("📦 已派发批次: {}", report.batches_dispatched);
    info!("❌ 题块错误: {}", report.block_errors.len());
    for e in &report.block_errors {
        info!("   [题块 {}] {}", e.ordinal, e.reason);
    }
    if let Some(tail) = &report.tail_error {
        info!("❌ 坏尾: {}", tail);
    }
    info!("❌ 派发失败: {}", report.dispatch_errors.len());
    for e in &report.dispatch_errors {
        info!("   [批次 {}] {}", e.batch_ordinal, e.reason);
    }
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", config.output_file);
}

/// 把最终报告追加到日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `report`: 流水线最终报告
pub fn append_report(log_file_path: &str, report: &PipelineReport) -> Result<()> {
    let mut text = serde_json::to_string_pretty(report)?;
    text.push('\n');
    let existing = fs::read_to_string(log_file_path).unwrap_or_default();
    fs::write(log_file_path, existing + &text)?;
    Ok(())
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
