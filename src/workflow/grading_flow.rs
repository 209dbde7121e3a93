//! 条目评分流程 - 流程层
//!
//! 核心职责：定义"一个条目"的完整处理流程
//!
//! 流程顺序：
//! 1. 调用评分器（空输入由 JudgeInvoker 直接给出固定评分）
//! 2. 成功 → 交给编排层写入存储
//! 3. 调用失败 → 记录为本次运行的失败条目，不中断批处理

use tracing::{error, info, warn};

use crate::error::JudgeError;
use crate::models::{GradingResult, WorkItem};
use crate::services::JudgeInvoker;
use crate::utils::logging::truncate_text;

/// 单个条目的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// 得到评分结果（含模型拒绝的 Failed 记录），需要持久化
    Graded(GradingResult),
    /// 评分器调用失败，不持久化
    InvocationFailed { index: usize, error: String },
}

/// 条目评分流程
///
/// - 编排单个条目的评分
/// - 不持有存储，不写文件
/// - 可以 clone 后放入并发任务
#[derive(Clone)]
pub struct GradingFlow {
    invoker: JudgeInvoker,
    verbose_logging: bool,
}

impl GradingFlow {
    pub fn new(invoker: JudgeInvoker, verbose_logging: bool) -> Self {
        Self {
            invoker,
            verbose_logging,
        }
    }

    pub async fn run(&self, item: &WorkItem) -> ItemOutcome {
        if self.verbose_logging {
            info!("{} OCR 预览: {}", item, truncate_text(&item.ocr_text, 60));
        }

        match self.invoker.invoke(item).await {
            Ok(result) => {
                match &result {
                    GradingResult::Scored { scores, .. } => info!(
                        "[条目 {}] ✓ 评分完成: 总分 {:.1}",
                        item.index, scores.overall_score
                    ),
                    GradingResult::Failed { error, .. } => {
                        warn!("[条目 {}] ⚠️ 评分被拒绝: {}", item.index, error)
                    }
                }
                ItemOutcome::Graded(result)
            }
            Err(e) => {
                error!("[条目 {}] ❌ 评分失败: {}", item.index, e);
                ItemOutcome::InvocationFailed {
                    index: item.index,
                    error: e.to_string(),
                }
            }
        }
    }

    /// 任务异常退出时的结果
    pub fn aborted(index: usize, reason: impl Into<String>) -> ItemOutcome {
        let error = JudgeError::TaskAborted(reason.into());
        error!("[条目 {}] 任务执行失败: {}", index, error);
        ItemOutcome::InvocationFailed {
            index,
            error: error.to_string(),
        }
    }
}
