//! 结果存储服务 - 业务能力层
//!
//! 只负责"持久化评分结果"能力，不关心流程
//!
//! ## 文件
//! - `grading_results.json` - 权威数据，扁平记录数组，每个索引一条
//! - `grading_results.csv` - 同样的行，供外部分析
//! - `progress.json` - 已处理数量 + 更新时间，仅用于观察
//! - `summary_report.json` / `detailed_report.html` - 运行结束时写入
//!
//! 所有文件都通过 [`write_atomic`] 写入。

use crate::error::StoreError;
use crate::infrastructure::write_atomic;
use crate::models::{GradingResult, ResultRecord, ResultSet, Summary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const RESULTS_FILE: &str = "grading_results.json";
pub const CSV_FILE: &str = "grading_results.csv";
pub const PROGRESS_FILE: &str = "progress.json";
pub const SUMMARY_FILE: &str = "summary_report.json";
pub const REPORT_FILE: &str = "detailed_report.html";

const CSV_HEADER: &str = "index,overall_score,character_accuracy,word_accuracy,confidence_level,error";

/// 进度记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub total_processed: usize,
    pub last_updated: String,
}

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// 结果存储
///
/// 职责：
/// - 每次 append 都从磁盘读取当前状态、按索引合并、整体写回
/// - 不在内存中保存任何跨重启需要的状态
/// - I/O 错误原样返回给调用方，不在内部重试
#[derive(Debug, Clone)]
pub struct ResultStore {
    output_dir: PathBuf,
}

impl ResultStore {
    /// 打开（必要时创建）输出目录
    pub fn open(output_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| StoreError::CreateDirFailed {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(RESULTS_FILE)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(CSV_FILE)
    }

    pub fn progress_path(&self) -> PathBuf {
        self.output_dir.join(PROGRESS_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }

    /// 导出文件路径
    pub fn export_path(&self, format: ExportFormat) -> PathBuf {
        match format {
            ExportFormat::Json => self.results_path(),
            ExportFormat::Csv => self.csv_path(),
        }
    }

    /// 读取全部结果
    ///
    /// 文件不存在返回空集合；文件损坏或记录无效返回错误。
    pub fn load_all(&self) -> Result<ResultSet, StoreError> {
        let path = self.results_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ResultSet::new()),
            Err(source) => return Err(StoreError::ReadFailed { path, source }),
        };

        let records: Vec<ResultRecord> = serde_json::from_str(&content)
            .map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;

        let mut set = ResultSet::new();
        for record in records {
            let index = record.index;
            let result = GradingResult::try_from(record).map_err(|reason| {
                StoreError::InvalidRecord {
                    path: path.clone(),
                    index,
                    reason,
                }
            })?;
            set.insert(result);
        }

        debug!("从 {} 读取 {} 条结果", path.display(), set.len());
        Ok(set)
    }

    /// 已处理的索引集合（用于断点续跑）
    pub fn processed_indices(&self) -> Result<BTreeSet<usize>, StoreError> {
        Ok(self.load_all()?.indices().collect())
    }

    /// 持久化一条结果，返回后即可被新的 `load_all` 读到
    ///
    /// 同一索引再次写入会覆盖旧记录，不会重复。
    pub fn append(&self, result: GradingResult) -> Result<(), StoreError> {
        let mut set = self.load_all()?;
        let index = result.index();
        if set.insert(result).is_some() {
            debug!("[条目 {}] 覆盖已有结果", index);
        }

        let records = set.to_records();
        self.write_json(&self.results_path(), &records)?;
        self.write_csv(&records)?;
        self.write_progress(records.len())?;
        Ok(())
    }

    /// 读取进度记录
    pub fn read_progress(&self) -> Result<Option<Progress>, StoreError> {
        let path = self.progress_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::ReadFailed { path, source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    /// 写入汇总报告
    pub fn write_summary(&self, summary: &Summary) -> Result<(), StoreError> {
        self.write_json(&self.summary_path(), summary)
    }

    /// 写入 HTML 报告
    pub fn write_report(&self, document: &str) -> Result<(), StoreError> {
        let path = self.report_path();
        write_atomic(&path, document.as_bytes())
            .map_err(|source| StoreError::WriteFailed { path, source })
    }

    fn write_progress(&self, total_processed: usize) -> Result<(), StoreError> {
        let progress = Progress {
            total_processed,
            last_updated: chrono::Local::now().to_rfc3339(),
        };
        self.write_json(&self.progress_path(), &progress)
    }

    fn write_csv(&self, records: &[ResultRecord]) -> Result<(), StoreError> {
        let path = self.csv_path();
        write_atomic(&path, records_to_csv(records).as_bytes())
            .map_err(|source| StoreError::WriteFailed { path, source })
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let mut data =
            serde_json::to_vec_pretty(value).map_err(|source| StoreError::SerializeFailed {
                path: path.to_path_buf(),
                source,
            })?;
        data.push(b'\n');
        write_atomic(path, &data).map_err(|source| StoreError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn records_to_csv(records: &[ResultRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for record in records {
        let cells = [
            record.index.to_string(),
            format_cell(record.overall_score),
            format_cell(record.character_accuracy),
            format_cell(record.word_accuracy),
            format_cell(record.confidence_level),
            escape_csv_cell(record.error.as_deref().unwrap_or("")),
        ];
        lines.push(cells.join(","));
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn escape_csv_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
