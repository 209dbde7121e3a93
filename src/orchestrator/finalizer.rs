//! 收尾处理 - 编排层
//!
//! 从存储读取完整结果集，计算汇总、写入 `summary_report.json`
//! 和 `detailed_report.html`。

use crate::error::StoreError;
use crate::models::Summary;
use crate::services::{render, summarize, ResultStore};
use crate::utils::logging::print_final_stats;
use tracing::info;

/// 生成最终报告
///
/// # 参数
/// - `store`: 结果存储
/// - `failed_indices`: 本次运行中评分器调用失败的索引
///
/// # 返回
/// 返回写入磁盘的汇总统计
pub fn finalize(store: &ResultStore, failed_indices: &[usize]) -> Result<Summary, StoreError> {
    info!("📝 正在生成最终报告...");

    let results = store.load_all()?;
    let summary = summarize(&results, failed_indices);

    store.write_summary(&summary)?;
    store.write_report(&render(&summary))?;

    info!("✓ 汇总报告: {}", store.summary_path().display());
    info!("✓ HTML 报告: {}", store.report_path().display());

    print_final_stats(
        summary.successful,
        summary.failed,
        summary.total_files,
        summary.overall_score_stats.mean,
        store.output_dir(),
    );

    Ok(summary)
}
