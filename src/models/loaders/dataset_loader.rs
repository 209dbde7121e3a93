use crate::config::Config;
use crate::error::DatasetError;
use crate::models::work_item::WorkItem;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// 数据集中的一行，只关心标准答案列，其余列忽略
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetEntry {
    pub true_markdown_output: String,
}

/// 加载数据集文件（JSON 数组或 JSON Lines）
pub async fn load_dataset(path: &Path) -> Result<Vec<DatasetEntry>, DatasetError> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| DatasetError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

    let entries = parse_dataset(&content, path)?;
    if entries.is_empty() {
        return Err(DatasetError::Empty(path.to_path_buf()));
    }

    debug!("数据集 {} 共 {} 行", path.display(), entries.len());
    Ok(entries)
}

fn parse_dataset(content: &str, path: &Path) -> Result<Vec<DatasetEntry>, DatasetError> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).map_err(|source| DatasetError::ParseFailed {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        });
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| DatasetError::ParseFailed {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// 读取文本文件；非 UTF-8 内容按 Latin-1 解码
pub async fn read_text_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path).await?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("{} 不是 UTF-8 编码，按 Latin-1 读取", path.display());
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    })
}

/// OCR 输出文件路径：`<ocr_dir>/<ocr_source>/<index><suffix>.txt`
pub fn ocr_file_path(config: &Config, index: usize) -> PathBuf {
    config
        .ocr_dir
        .join(&config.ocr_source)
        .join(format!("{}{}.txt", index, config.ocr_file_suffix))
}

/// 将数据集与 OCR 输出配对，生成有序的 WorkItem 序列（index = 行号）
pub async fn load_work_items(config: &Config) -> Result<Vec<WorkItem>, DatasetError> {
    if !fs::try_exists(&config.ocr_dir).await.unwrap_or(false) {
        return Err(DatasetError::OcrDirNotFound(config.ocr_dir.clone()));
    }

    let dataset = load_dataset(&config.dataset_path).await?;
    let mut items = Vec::with_capacity(dataset.len());
    let mut missing = 0usize;

    for (index, entry) in dataset.into_iter().enumerate() {
        let ocr_path = ocr_file_path(config, index);
        let ocr_text = match read_text_lossy(&ocr_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "[条目 {}] ⚠️ OCR 文件不存在: {}，按空文本处理",
                    index,
                    ocr_path.display()
                );
                missing += 1;
                String::new()
            }
            Err(source) => {
                return Err(DatasetError::ReadFailed {
                    path: ocr_path,
                    source,
                })
            }
        };
        items.push(WorkItem::new(ocr_text, entry.true_markdown_output, index));
    }

    info!("✓ 已加载 {} 个条目 (缺少 OCR 文件: {})", items.len(), missing);
    Ok(items)
}
