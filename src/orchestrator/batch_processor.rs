//! 批量评分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个评分流程的入口，负责条目调度和存储写入。
//!
//! ## 核心功能
//!
//! 1. **初始化**：校验配置、打开结果存储、加载全部条目
//! 2. **续跑**：跳过存储中已有结果的索引
//! 3. **并发控制**：使用 Semaphore 限制同时进行的评分数量
//! 4. **单写者**：只有 `run` 的主循环写存储，任务只返回结果
//! 5. **收尾**：所有条目调度完成后生成汇总和报告
//!
//! ## 错误策略
//!
//! - 单个条目失败只记入失败列表，批处理继续
//! - 存储写入失败立即停止调度，尽量生成报告后返回错误

use crate::config::{Config, Preset};
use crate::error::{AppResult, StoreError};
use crate::models::{load_work_items, Summary, WorkItem};
use crate::orchestrator::finalizer::finalize;
use crate::services::{Judge, JudgeInvoker, ResultStore};
use crate::utils::logging::{log_items_loaded, log_startup};
use crate::workflow::{GradingFlow, ItemOutcome};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: Summary,
    /// 本次运行中评分器调用失败的索引
    pub failed_indices: Vec<usize>,
    /// 续跑时跳过的条目数
    pub skipped: usize,
    /// 本次实际调度的条目数
    pub dispatched: usize,
}

/// 应用主结构
pub struct App {
    config: Config,
    store: ResultStore,
    items: Vec<WorkItem>,
    flow: GradingFlow,
}

impl App {
    /// 初始化应用
    ///
    /// 配置无效、输出目录无法创建、数据集缺失或为空时返回错误，
    /// 此时不会调度任何条目。
    pub async fn initialize(config: Config, judge: Arc<dyn Judge>) -> AppResult<Self> {
        config.validate()?;

        log_startup(
            &config.judge_model_name,
            config.max_concurrent_items,
            &config.output_dir,
        );

        let store = ResultStore::open(config.output_dir.clone())?;

        info!("\n📁 正在加载数据集: {}", config.dataset_path.display());
        let items = load_work_items(&config).await?;

        let invoker = JudgeInvoker::new(judge)
            .with_timeout(config.judge_timeout_secs.map(Duration::from_secs));
        let flow = GradingFlow::new(invoker, config.verbose_logging);

        Ok(Self {
            config,
            store,
            items,
            flow,
        })
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// 计算待处理条目；续跑时跳过已评分的索引
    pub fn pending_items(&self, resume: bool) -> AppResult<Vec<WorkItem>> {
        let processed: BTreeSet<usize> = if resume {
            self.store.processed_indices()?
        } else {
            let existing = self.store.processed_indices()?;
            if !existing.is_empty() {
                warn!(
                    "⚠️ 输出目录已有 {} 条结果，未启用续跑，将按索引覆盖",
                    existing.len()
                );
            }
            BTreeSet::new()
        };

        Ok(self
            .items
            .iter()
            .filter(|item| !processed.contains(&item.index))
            .cloned()
            .collect())
    }

    /// 只估算费用，不调度
    pub fn estimate(&self, preset: &Preset, resume: bool) -> AppResult<f64> {
        let pending = self.pending_items(resume)?.len();
        let cost = preset.estimate_cost(pending);
        info!(
            "💰 预计使用预设 '{}' 评分 {} 个条目的费用: ${:.2}",
            preset.name, pending, cost
        );
        Ok(cost)
    }

    /// 运行应用主逻辑
    pub async fn run(&self, resume: bool) -> AppResult<RunReport> {
        let pending = self.pending_items(resume)?;
        let skipped = self.items.len() - pending.len();
        log_items_loaded(self.items.len(), pending.len(), skipped);

        let dispatched = pending.len();
        let (failed_indices, store_error) = self.dispatch_all(pending).await;

        match store_error {
            None => {
                let summary = finalize(&self.store, &failed_indices)?;
                Ok(RunReport {
                    summary,
                    failed_indices,
                    skipped,
                    dispatched,
                })
            }
            Some(e) => {
                error!("❌ 存储写入失败，停止评分: {}", e);
                if let Err(report_err) = finalize(&self.store, &failed_indices) {
                    error!("❌ 生成报告失败: {}", report_err);
                }
                Err(e.into())
            }
        }
    }

    /// 调度所有待处理条目
    ///
    /// 任务按索引顺序等待，结果按同样的顺序写入存储。
    /// 返回 (调用失败的索引, 导致中止的存储错误)。
    async fn dispatch_all(&self, pending: Vec<WorkItem>) -> (Vec<usize>, Option<StoreError>) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_items));
        let total = pending.len();

        let mut handles: Vec<(usize, JoinHandle<ItemOutcome>)> = Vec::with_capacity(total);
        for item in pending {
            let index = item.index;
            let flow = self.flow.clone();
            let semaphore = semaphore.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return GradingFlow::aborted(index, e.to_string()),
                };
                flow.run(&item).await
            });
            handles.push((index, handle));
        }

        let mut failed_indices = Vec::new();
        let mut handles = handles.into_iter();
        let mut done = 0usize;

        while let Some((index, handle)) = handles.next() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => GradingFlow::aborted(index, e.to_string()),
            };
            done += 1;

            match outcome {
                ItemOutcome::Graded(result) => {
                    if let Err(e) = self.store.append(result) {
                        for (_, rest) in handles {
                            rest.abort();
                        }
                        return (failed_indices, Some(e));
                    }
                }
                ItemOutcome::InvocationFailed { index, .. } => failed_indices.push(index),
            }

            if done % 10 == 0 || done == total {
                info!("⏳ 进度: {}/{} (失败 {})", done, total, failed_indices.len());
            }
        }

        (failed_indices, None)
    }
}
