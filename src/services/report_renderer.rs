//! 报告渲染服务 - 业务能力层
//!
//! 把 [`Summary`] 渲染成固定结构的 HTML 文档。相同输入总是得到相同输出，
//! 所有数字保留一位小数。

use crate::models::{MetricStats, Summary};

const STYLE: &str = r#"        body { font-family: Arial, sans-serif; margin: 40px; }
        .header { color: #333; border-bottom: 2px solid #ccc; padding-bottom: 10px; }
        .summary { background-color: #f9f9f9; padding: 20px; margin: 20px 0; border-radius: 5px; }
        .stats { display: flex; justify-content: space-around; margin: 20px 0; }
        .stat-box { text-align: center; padding: 15px; background-color: white; border-radius: 5px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .distribution { margin: 20px 0; }
        table { width: 100%; border-collapse: collapse; margin: 20px 0; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #f2f2f2; }"#;

/// 渲染 HTML 报告
pub fn render(summary: &Summary) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("    <meta charset=\"utf-8\">\n");
    html.push_str("    <title>OCR Grading Report</title>\n");
    html.push_str(&format!("    <style>\n{}\n    </style>\n", STYLE));
    html.push_str("</head>\n<body>\n");

    html.push_str("    <div class=\"header\">\n");
    html.push_str("        <h1>OCR Accuracy Grading Report</h1>\n");
    html.push_str(&format!(
        "        <p>Generated on: {}</p>\n",
        escape_html(&summary.processing_date)
    ));
    html.push_str("    </div>\n");

    html.push_str("    <div class=\"summary\">\n");
    html.push_str("        <h2>Summary Statistics</h2>\n");
    html.push_str("        <div class=\"stats\">\n");
    html.push_str(&stat_box(&summary.total_files.to_string(), "Total Files"));
    html.push_str(&stat_box(&summary.successful.to_string(), "Successfully Processed"));
    html.push_str(&stat_box(&summary.failed.to_string(), "Failed"));
    html.push_str(&stat_box(
        &format!("{:.1}", summary.overall_score_stats.mean),
        "Average Overall Score",
    ));
    html.push_str("        </div>\n");
    html.push_str("    </div>\n");

    html.push_str("    <div class=\"distribution\">\n");
    html.push_str("        <h2>Score Distribution</h2>\n");
    html.push_str("        <table>\n");
    html.push_str("            <tr><th>Score Range</th><th>Count</th><th>Percentage</th></tr>\n");
    for (label, count) in summary.score_distribution.buckets() {
        html.push_str(&format!(
            "            <tr><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
            label,
            count,
            percentage(count, summary.successful)
        ));
    }
    html.push_str("        </table>\n");
    html.push_str("    </div>\n");

    html.push_str("    <div class=\"metrics\">\n");
    html.push_str("        <h2>Metric Statistics</h2>\n");
    html.push_str("        <table>\n");
    html.push_str(
        "            <tr><th>Metric</th><th>Mean</th><th>Min</th><th>Max</th><th>Count</th></tr>\n",
    );
    html.push_str(&metric_row("Overall Score", &summary.overall_score_stats));
    html.push_str(&metric_row("Character Accuracy", &summary.character_accuracy_stats));
    html.push_str(&metric_row("Word Accuracy", &summary.word_accuracy_stats));
    html.push_str("        </table>\n");
    html.push_str("    </div>\n");

    html.push_str("</body>\n</html>\n");
    html
}

fn stat_box(value: &str, label: &str) -> String {
    format!(
        "            <div class=\"stat-box\">\n                <h3>{}</h3>\n                <p>{}</p>\n            </div>\n",
        value, label
    )
}

fn metric_row(name: &str, stats: &MetricStats) -> String {
    format!(
        "            <tr><td>{}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td></tr>\n",
        name, stats.mean, stats.min, stats.max, stats.count
    )
}

/// successful 为 0 时返回 0
fn percentage(count: usize, successful: usize) -> f64 {
    if successful == 0 {
        0.0
    } else {
        count as f64 / successful as f64 * 100.0
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreDistribution;

    fn sample_summary() -> Summary {
        Summary {
            total_files: 3,
            successful: 2,
            failed: 1,
            processing_date: "2026-10-14T09:30:00+08:00".to_string(),
            overall_score_stats: MetricStats {
                mean: 45.0,
                min: 0.0,
                max: 90.0,
                count: 2,
            },
            character_accuracy_stats: MetricStats {
                mean: 47.5,
                min: 0.0,
                max: 95.0,
                count: 2,
            },
            word_accuracy_stats: MetricStats {
                mean: 46.0,
                min: 0.0,
                max: 92.0,
                count: 2,
            },
            score_distribution: ScoreDistribution {
                range_0_20: 1,
                range_81_100: 1,
                ..Default::default()
            },
            failed_indices: vec![1],
        }
    }

    #[test]
    fn test_render_headline_and_buckets() {
        let html = render(&sample_summary());

        assert!(html.contains("Generated on: 2026-10-14T09:30:00+08:00"));
        assert!(html.contains("<h3>3</h3>"));
        assert!(html.contains("<h3>45.0</h3>"));
        assert!(html.contains("<tr><td>0-20</td><td>1</td><td>50.0%</td></tr>"));
        assert!(html.contains("<tr><td>41-60</td><td>0</td><td>0.0%</td></tr>"));
        assert!(html.contains("<tr><td>81-100</td><td>1</td><td>50.0%</td></tr>"));
        assert!(html.contains("<td>Character Accuracy</td><td>47.5</td>"));
    }

    #[test]
    fn test_render_zero_successful_uses_zero_percent() {
        let mut summary = sample_summary();
        summary.successful = 0;
        summary.score_distribution = ScoreDistribution::default();

        let html = render(&summary);
        assert_eq!(html.matches("<td>0.0%</td>").count(), 5);
        assert!(!html.contains("NaN"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let summary = sample_summary();
        assert_eq!(render(&summary), render(&summary));
    }

    #[test]
    fn test_bucket_rows_are_in_fixed_order() {
        let html = render(&sample_summary());
        let positions: Vec<usize> = ["0-20", "21-40", "41-60", "61-80", "81-100"]
            .iter()
            .map(|label| html.find(&format!("<td>{}</td>", label)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
