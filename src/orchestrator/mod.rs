//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和收尾，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量评分处理器
//! - 初始化（配置校验、结果存储、数据集）
//! - 计算待处理条目（续跑时跳过已评分索引）
//! - 控制并发数量（Semaphore）
//! - 唯一写存储的地方
//!
//! ### `finalizer` - 收尾处理
//! - 从存储读取完整结果集
//! - 计算汇总、渲染报告、写入磁盘
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<WorkItem>)
//!     ↓
//! workflow::GradingFlow (处理单个 WorkItem)
//!     ↓
//! services (能力层：judge / result_store / stats / report_renderer)
//!     ↓
//! clients / infrastructure (LLM 客户端、原子写文件)
//! ```

pub mod batch_processor;
pub mod finalizer;

// 重新导出主要类型
pub use batch_processor::{App, RunReport};
pub use finalizer::finalize;
