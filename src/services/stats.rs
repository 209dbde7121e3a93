//! 统计服务 - 业务能力层
//!
//! 由完整结果集和失败索引列表计算 [`Summary`]，纯函数，无 I/O。

use crate::models::{GradingResult, MetricStats, ResultSet, ScoreDistribution, Summary};
use chrono::{DateTime, Local};
use std::collections::BTreeSet;

/// 计算汇总统计，`processing_date` 取当前时间
pub fn summarize(results: &ResultSet, failed_indices: &[usize]) -> Summary {
    summarize_at(results, failed_indices, Local::now())
}

/// 计算汇总统计
///
/// - `successful` = Scored 数量
/// - `failed` = Failed 记录数量 + 不在结果集中的失败索引数量（去重）
/// - 三项指标只统计 Scored；没有数据时全部为 0
pub fn summarize_at(
    results: &ResultSet,
    failed_indices: &[usize],
    processing_date: DateTime<Local>,
) -> Summary {
    let mut overall = Vec::new();
    let mut character = Vec::new();
    let mut word = Vec::new();
    let mut failed_records = 0usize;

    for result in results.iter() {
        match result {
            GradingResult::Scored { scores, .. } => {
                overall.push(scores.overall_score);
                character.push(scores.character_accuracy);
                word.push(scores.word_accuracy);
            }
            GradingResult::Failed { .. } => failed_records += 1,
        }
    }

    let unrecorded_failures: Vec<usize> = failed_indices
        .iter()
        .copied()
        .filter(|index| !results.contains(*index))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut score_distribution = ScoreDistribution::default();
    for &score in &overall {
        score_distribution.record(score);
    }

    let successful = overall.len();
    let failed = failed_records + unrecorded_failures.len();

    Summary {
        total_files: successful + failed,
        successful,
        failed,
        processing_date: processing_date.to_rfc3339(),
        overall_score_stats: metric_stats(&overall),
        character_accuracy_stats: metric_stats(&character),
        word_accuracy_stats: metric_stats(&word),
        score_distribution,
        failed_indices: unrecorded_failures,
    }
}

fn metric_stats(values: &[f64]) -> MetricStats {
    if values.is_empty() {
        return MetricStats::default();
    }

    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // 浮点累加误差可能让均值略微越界
    let mean = (sum / values.len() as f64).clamp(min, max);

    MetricStats {
        mean,
        min,
        max,
        count: values.len(),
    }
}
