//! 评分服务 - 业务能力层
//!
//! 只负责"给一个条目打分"能力，不写存储、不关心流程
//!
//! - [`Judge`] 是外部评分器的抽象，运行时使用 [`LlmJudge`]，测试中可替换为假实现
//! - [`JudgeInvoker`] 在调用评分器之前处理空输入，并可选地加上超时

use crate::clients::{LlmClient, LlmReply};
use crate::config::Config;
use crate::error::JudgeError;
use crate::models::{GradingResult, Scores, WorkItem};
use async_openai::types::chat::{ResponseFormat, ResponseFormatJsonSchema};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

/// 外部评分器
#[async_trait]
pub trait Judge: Send + Sync {
    /// 对单个条目评分
    ///
    /// 传输失败或返回结构无法解析时返回 `Err`；
    /// 模型明确拒绝时返回 `GradingResult::Failed`。
    async fn grade(&self, item: &WorkItem) -> Result<GradingResult, JudgeError>;
}

/// 评分器调用入口
#[derive(Clone)]
pub struct JudgeInvoker {
    judge: Arc<dyn Judge>,
    timeout: Option<Duration>,
}

impl JudgeInvoker {
    pub fn new(judge: Arc<dyn Judge>) -> Self {
        Self {
            judge,
            timeout: None,
        }
    }

    /// 为每次外部调用设置超时
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 评分一个条目
    ///
    /// 空输入直接返回固定评分，不调用外部评分器。
    pub async fn invoke(&self, item: &WorkItem) -> Result<GradingResult, JudgeError> {
        if item.is_degenerate() {
            debug!("[条目 {}] 输入为空，使用固定评分", item.index);
            return Ok(GradingResult::Scored {
                index: item.index,
                scores: Scores::degenerate(),
            });
        }

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.judge.grade(item))
                .await
                .map_err(|_| JudgeError::Timeout {
                    millis: limit.as_millis(),
                })??,
            None => self.judge.grade(item).await?,
        };

        Ok(reindex(result, item.index))
    }
}

/// 结果的索引始终以条目为准
fn reindex(result: GradingResult, index: usize) -> GradingResult {
    match result {
        GradingResult::Scored { scores, .. } => GradingResult::Scored { index, scores },
        GradingResult::Failed { error, .. } => GradingResult::Failed { index, error },
    }
}

const SYSTEM_MESSAGE: &str = "You are an expert evaluator assessing the accuracy of OCR (Optical Character Recognition) output against ground truth text. You always answer with a single JSON object.";

const SCORE_FIELDS: [&str; 4] = [
    "overall_score",
    "character_accuracy",
    "word_accuracy",
    "confidence_level",
];

/// 基于 LLM 的评分器
///
/// 端点支持时请求 JSON Schema 约束的回复；`parse_scores` 同时兼容自由文本回复。
pub struct LlmJudge {
    client: LlmClient,
    response_format: Option<ResponseFormat>,
}

impl LlmJudge {
    pub fn new(config: &Config) -> Self {
        Self {
            client: LlmClient::new(config),
            response_format: config.judge_structured_output.then(score_response_format),
        }
    }

    fn build_prompt(item: &WorkItem) -> String {
        format!(
            r#"Your task is to compare OCR-extracted text with the ground truth and provide a comprehensive accuracy assessment.
Ground truth text is in markdown format, and OCR text is in plain text.
Please ignore any markdown formatting in the ground truth text.

**OCR OUTPUT:**
{}

**GROUND TRUTH:**
{}

Please analyze the OCR accuracy and provide your assessment in the following JSON format:

{{
    "overall_score": <number between 0-100>,
    "character_accuracy": <percentage of correctly recognized characters>,
    "word_accuracy": <percentage of correctly recognized words>,
    "confidence_level": <your confidence in this assessment, 0-100>
}}

Focus on:
1. Character-level accuracy
2. Word-level accuracy
3. Preservation of formatting and structure
4. Common OCR error patterns
5. Overall readability and usability

Be precise and objective in your assessment. Consider the practical impact of errors on text usability.
Return only the JSON object."#,
            item.ocr_text, item.ground_truth
        )
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn grade(&self, item: &WorkItem) -> Result<GradingResult, JudgeError> {
        let prompt = Self::build_prompt(item);

        let reply = self
            .client
            .chat(&prompt, Some(SYSTEM_MESSAGE), self.response_format.as_ref())
            .await?;

        match reply {
            LlmReply::Content(content) => {
                let scores = parse_scores(&content)?;
                debug!(
                    "[条目 {}] 评分: overall={:.1} char={:.1} word={:.1} conf={:.1}",
                    item.index,
                    scores.overall_score,
                    scores.character_accuracy,
                    scores.word_accuracy,
                    scores.confidence_level
                );
                Ok(GradingResult::Scored {
                    index: item.index,
                    scores,
                })
            }
            LlmReply::Refusal(refusal) => {
                info!("[条目 {}] ⚠️ 模型拒绝评分: {}", item.index, refusal);
                Ok(GradingResult::Failed {
                    index: item.index,
                    error: refusal,
                })
            }
        }
    }
}

/// 四项评分的 JSON Schema（strict 模式要求列出全部字段并禁止额外字段）
fn score_response_format() -> ResponseFormat {
    let properties: serde_json::Map<String, serde_json::Value> = SCORE_FIELDS
        .iter()
        .map(|field| {
            (
                field.to_string(),
                serde_json::json!({ "type": "number", "minimum": 0, "maximum": 100 }),
            )
        })
        .collect();

    ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            description: Some("OCR accuracy assessment".to_string()),
            name: "ocr_grading".to_string(),
            schema: Some(serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": SCORE_FIELDS,
                "additionalProperties": false,
            })),
            strict: Some(true),
        },
    }
}

#[derive(Debug, Deserialize)]
struct RawScores {
    overall_score: f64,
    character_accuracy: f64,
    word_accuracy: f64,
    confidence_level: f64,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"))
}

/// 从 LLM 回复中解析四项评分
///
/// 支持 ```json 代码块包裹以及 JSON 前后带有说明文字的情况。
pub fn parse_scores(response: &str) -> Result<Scores, JudgeError> {
    let body = fence_regex()
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response)
        .trim();

    let json = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    };

    let raw: RawScores = serde_json::from_str(json).map_err(|e| JudgeError::ParseFailed {
        response: crate::utils::logging::truncate_text(response, 200),
        reason: e.to_string(),
    })?;

    Ok(Scores {
        overall_score: check_range("overall_score", raw.overall_score)?,
        character_accuracy: check_range("character_accuracy", raw.character_accuracy)?,
        word_accuracy: check_range("word_accuracy", raw.word_accuracy)?,
        confidence_level: check_range("confidence_level", raw.confidence_level)?,
    })
}

fn check_range(field: &'static str, value: f64) -> Result<f64, JudgeError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(JudgeError::ScoreOutOfRange { field, value })
    }
}
