//! # OCR Grader
//!
//! 用 LLM 评分器对 OCR 输出和标准答案进行打分，并生成可续跑的结果和报告
//!
//! ## 架构设计
//!
//! 本系统沿用分层架构：
//!
//! ### ① 基础设施层（Infrastructure / Clients）
//! - `infrastructure/` - 原子文件写入（临时文件 + rename）
//! - `clients/` - `LlmClient`，OpenAI 兼容接口 + 重试
//!
//! ### ② 业务能力层（Services）
//! - `Judge` / `JudgeInvoker` - 单个条目评分能力（空输入固定评分、超时）
//! - `ResultStore` - 按索引去重的持久化结果存储
//! - `stats` - 汇总统计（纯函数）
//! - `report_renderer` - HTML 报告渲染（纯函数）
//!
//! ### ③ 流程层（Workflow）
//! - `GradingFlow` - "一个条目"的评分流程，失败在本层被吸收
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 加载、续跑、并发调度、单写者
//! - `orchestrator/finalizer` - 汇总和报告
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Preset};
pub use error::{AppError, AppResult};
pub use models::{GradingResult, ResultSet, Scores, Summary, WorkItem};
pub use orchestrator::{finalize, App, RunReport};
pub use services::{Judge, JudgeInvoker, LlmJudge, ResultStore};
pub use workflow::{GradingFlow, ItemOutcome};
