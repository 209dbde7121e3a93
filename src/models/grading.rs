//! 评分结果模型
//!
//! `GradingResult` 在评分器边界一次性确定为 `Scored` 或 `Failed`，
//! 下游只做模式匹配，不再检查字段是否存在。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 四项百分制指标，取值范围 [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub overall_score: f64,
    pub character_accuracy: f64,
    pub word_accuracy: f64,
    pub confidence_level: f64,
}

impl Scores {
    /// 空输入的固定评分：三项准确率为 0，置信度 100
    pub fn degenerate() -> Self {
        Self {
            overall_score: 0.0,
            character_accuracy: 0.0,
            word_accuracy: 0.0,
            confidence_level: 100.0,
        }
    }
}

/// 单个条目的评分结果
#[derive(Debug, Clone, PartialEq)]
pub enum GradingResult {
    Scored { index: usize, scores: Scores },
    Failed { index: usize, error: String },
}

impl GradingResult {
    pub fn index(&self) -> usize {
        match self {
            GradingResult::Scored { index, .. } | GradingResult::Failed { index, .. } => *index,
        }
    }

    pub fn scores(&self) -> Option<&Scores> {
        match self {
            GradingResult::Scored { scores, .. } => Some(scores),
            GradingResult::Failed { .. } => None,
        }
    }
}

/// 持久化用的扁平记录（JSON / CSV 共用一行结构）
///
/// 失败时数值字段为 null、`error` 有值；成功时 `error` 为 null。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub index: usize,
    pub overall_score: Option<f64>,
    pub character_accuracy: Option<f64>,
    pub word_accuracy: Option<f64>,
    pub confidence_level: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<&GradingResult> for ResultRecord {
    fn from(result: &GradingResult) -> Self {
        match result {
            GradingResult::Scored { index, scores } => Self {
                index: *index,
                overall_score: Some(scores.overall_score),
                character_accuracy: Some(scores.character_accuracy),
                word_accuracy: Some(scores.word_accuracy),
                confidence_level: Some(scores.confidence_level),
                error: None,
            },
            GradingResult::Failed { index, error } => Self {
                index: *index,
                overall_score: None,
                character_accuracy: None,
                word_accuracy: None,
                confidence_level: None,
                error: Some(error.clone()),
            },
        }
    }
}

impl TryFrom<ResultRecord> for GradingResult {
    type Error = String;

    /// `error` 非空或四个数值字段全为 null 视为失败记录
    ///
    /// 否则四个数值字段必须齐全。
    fn try_from(record: ResultRecord) -> Result<Self, Self::Error> {
        let no_scores = record.overall_score.is_none()
            && record.character_accuracy.is_none()
            && record.word_accuracy.is_none()
            && record.confidence_level.is_none();

        match record.error {
            Some(error) if no_scores || !error.is_empty() => {
                return Ok(GradingResult::Failed {
                    index: record.index,
                    error,
                })
            }
            _ => {}
        }

        let field = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| format!("成功记录缺少字段 {}", name))
        };

        Ok(GradingResult::Scored {
            index: record.index,
            scores: Scores {
                overall_score: field(record.overall_score, "overall_score")?,
                character_accuracy: field(record.character_accuracy, "character_accuracy")?,
                word_accuracy: field(record.word_accuracy, "word_accuracy")?,
                confidence_level: field(record.confidence_level, "confidence_level")?,
            },
        })
    }
}

/// 当前全部评分结果，按索引排序，每个索引至多一条
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    results: BTreeMap<usize, GradingResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入结果；同一索引的旧结果被覆盖，返回被覆盖的旧值
    pub fn insert(&mut self, result: GradingResult) -> Option<GradingResult> {
        self.results.insert(result.index(), result)
    }

    pub fn get(&self, index: usize) -> Option<&GradingResult> {
        self.results.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.results.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GradingResult> {
        self.results.values()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.results.keys().copied()
    }

    pub fn to_records(&self) -> Vec<ResultRecord> {
        self.iter().map(ResultRecord::from).collect()
    }
}

impl FromIterator<GradingResult> for ResultSet {
    fn from_iter<I: IntoIterator<Item = GradingResult>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for result in iter {
            set.insert(result);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(index: usize, overall: f64) -> GradingResult {
        GradingResult::Scored {
            index,
            scores: Scores {
                overall_score: overall,
                character_accuracy: overall,
                word_accuracy: overall,
                confidence_level: 90.0,
            },
        }
    }

    #[test]
    fn test_insert_overwrites_same_index() {
        let mut set = ResultSet::new();
        assert!(set.insert(scored(3, 10.0)).is_none());
        let old = set.insert(scored(3, 70.0));

        assert_eq!(old, Some(scored(3, 10.0)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(3), Some(&scored(3, 70.0)));
    }

    #[test]
    fn test_iteration_is_index_ordered() {
        let set: ResultSet = vec![scored(5, 1.0), scored(0, 2.0), scored(2, 3.0)]
            .into_iter()
            .collect();
        assert_eq!(set.indices().collect::<Vec<_>>(), vec![0, 2, 5]);
    }

    #[test]
    fn test_failed_record_has_null_scores() {
        let failed = GradingResult::Failed {
            index: 1,
            error: "refused".to_string(),
        };
        let json = serde_json::to_value(ResultRecord::from(&failed)).unwrap();

        assert_eq!(json["index"], 1);
        assert!(json["overall_score"].is_null());
        assert!(json["confidence_level"].is_null());
        assert_eq!(json["error"], "refused");
    }

    #[test]
    fn test_record_without_scores_or_error_is_rejected() {
        let record = ResultRecord {
            index: 4,
            overall_score: Some(50.0),
            character_accuracy: None,
            word_accuracy: Some(50.0),
            confidence_level: Some(50.0),
            error: Some(String::new()),
        };
        let err = GradingResult::try_from(record).unwrap_err();
        assert!(err.contains("character_accuracy"));
    }

    #[test]
    fn test_failed_record_with_empty_error_reads_back() {
        let failed = GradingResult::Failed {
            index: 6,
            error: String::new(),
        };
        let record = ResultRecord::from(&failed);

        assert_eq!(GradingResult::try_from(record), Ok(failed));
    }

    #[test]
    fn test_empty_record_is_rejected() {
        let record = ResultRecord {
            index: 2,
            overall_score: None,
            character_accuracy: None,
            word_accuracy: None,
            confidence_level: None,
            error: None,
        };
        assert!(GradingResult::try_from(record).is_err());
    }
}
