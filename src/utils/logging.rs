/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`；否则默认 `info`，`verbose` 时为 `debug`。
/// 重复调用不会报错（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `model`: 评分模型
/// - `max_concurrent`: 最大并发数
/// - `output_dir`: 输出目录
pub fn log_startup(model: &str, max_concurrent: usize, output_dir: &Path) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - OCR 评分模式");
    info!("🤖 评分模型: {}", model);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("📁 输出目录: {}", output_dir.display());
    info!("{}", "=".repeat(60));
}

/// 记录条目加载信息
///
/// # 参数
/// - `total`: 条目总数
/// - `pending`: 待处理数量
/// - `skipped`: 续跑时跳过的数量
pub fn log_items_loaded(total: usize, pending: usize, skipped: usize) {
    info!("✓ 共 {} 个条目，待评分 {} 个", total, pending);
    if skipped > 0 {
        info!("⏭️ 续跑模式：跳过已评分的 {} 个条目", skipped);
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `successful`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `mean_score`: 平均总分
/// - `output_dir`: 输出目录
pub fn print_final_stats(
    successful: usize,
    failed: usize,
    total: usize,
    mean_score: f64,
    output_dir: &Path,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", successful, total);
    info!("❌ 失败: {}", failed);
    info!("📈 平均总分: {:.1}", mean_score);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_dir.display());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("一二三四五", 3), "一二三...");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
