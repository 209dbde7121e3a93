use std::fmt::Display;

/// 一个待评分条目：OCR 文本 + 标准答案
///
/// `index` 是数据集中的位置（从 0 开始，连续），也是所有输出文件的关联键。
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub ocr_text: String,
    pub ground_truth: String,
    pub index: usize,
}

impl WorkItem {
    pub fn new(ocr_text: impl Into<String>, ground_truth: impl Into<String>, index: usize) -> Self {
        Self {
            ocr_text: ocr_text.into(),
            ground_truth: ground_truth.into(),
            index,
        }
    }

    /// 任一侧为空（忽略空白）即为退化输入，不需要调用评分器
    pub fn is_degenerate(&self) -> bool {
        self.ocr_text.trim().is_empty() || self.ground_truth.trim().is_empty()
    }
}

impl Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[条目 {}] OCR {} 字符 / 标准答案 {} 字符",
            self.index,
            self.ocr_text.chars().count(),
            self.ground_truth.chars().count()
        )
    }
}
