use serde::{Deserialize, Serialize};

/// 单项指标的统计值
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// `overall_score` 的五档分布，每档含上界
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    #[serde(rename = "0-20")]
    pub range_0_20: usize,
    #[serde(rename = "21-40")]
    pub range_21_40: usize,
    #[serde(rename = "41-60")]
    pub range_41_60: usize,
    #[serde(rename = "61-80")]
    pub range_61_80: usize,
    #[serde(rename = "81-100")]
    pub range_81_100: usize,
}

impl ScoreDistribution {
    /// 将一个分数计入对应档位：[0,20], (20,40], (40,60], (60,80], (80,100]
    pub fn record(&mut self, score: f64) {
        let slot = if score <= 20.0 {
            &mut self.range_0_20
        } else if score <= 40.0 {
            &mut self.range_21_40
        } else if score <= 60.0 {
            &mut self.range_41_60
        } else if score <= 80.0 {
            &mut self.range_61_80
        } else {
            &mut self.range_81_100
        };
        *slot += 1;
    }

    /// 按固定顺序返回 (标签, 数量)
    pub fn buckets(&self) -> [(&'static str, usize); 5] {
        [
            ("0-20", self.range_0_20),
            ("21-40", self.range_21_40),
            ("41-60", self.range_41_60),
            ("61-80", self.range_61_80),
            ("81-100", self.range_81_100),
        ]
    }

    pub fn total(&self) -> usize {
        self.buckets().iter().map(|(_, count)| count).sum()
    }
}

/// 一次运行的汇总统计，每次运行结束时整体重算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub processing_date: String,
    pub overall_score_stats: MetricStats,
    pub character_accuracy_stats: MetricStats,
    pub word_accuracy_stats: MetricStats,
    pub score_distribution: ScoreDistribution,
    /// 本次运行中评分器调用失败（未持久化）的索引
    #[serde(default)]
    pub failed_indices: Vec<usize>,
}
