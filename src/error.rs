use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 结果存储错误（致命）
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 评分器调用错误（单条目级别，可恢复）
    #[error("评分器错误: {0}")]
    Judge(#[from] JudgeError),
    /// 数据集加载错误（致命）
    #[error("数据集错误: {0}")]
    Dataset(#[from] DatasetError),
    /// 配置错误（致命）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 结果存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 创建输出目录失败
    #[error("无法创建输出目录 {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("序列化失败 ({path}): {source}")]
    SerializeFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// 存储文件损坏（JSON 无法解析）
    #[error("存储文件已损坏 ({path}): {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// 存储记录不符合结构
    #[error("存储记录无效 ({path}, 索引 {index}): {reason}")]
    InvalidRecord {
        path: PathBuf,
        index: usize,
        reason: String,
    },
}

/// 评分器（Judge）调用错误
#[derive(Debug, Error)]
pub enum JudgeError {
    /// 构建请求失败
    #[error("构建 LLM 请求失败: {0}")]
    RequestBuildFailed(String),
    /// API 调用失败
    #[error("LLM API 调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 返回内容为空
    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 返回内容无法解析为评分结构
    #[error("无法解析评分结果 (响应: {response}): {reason}")]
    ParseFailed { response: String, reason: String },
    /// 分数超出 [0, 100]
    #[error("评分字段 {field} 超出范围 [0, 100]: {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },
    /// 调用超时
    #[error("评分器调用超时 ({millis} 毫秒)")]
    Timeout { millis: u128 },
    /// 任务异常退出
    #[error("评分任务异常退出: {0}")]
    TaskAborted(String),
}

/// 数据集 / 输入目录错误
#[derive(Debug, Error)]
pub enum DatasetError {
    /// 数据集文件不存在
    #[error("数据集文件不存在: {0}")]
    NotFound(PathBuf),
    /// OCR 目录不存在
    #[error("OCR 目录不存在: {0}")]
    OcrDirNotFound(PathBuf),
    /// 读取失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 解析失败
    #[error("数据集解析失败 ({path}, 第 {line} 行): {source}")]
    ParseFailed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    /// 数据集为空
    #[error("数据集为空: {0}")]
    Empty(PathBuf),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML 解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 未知预设
    #[error("未知预设: {name} (可用: {available})")]
    UnknownPreset { name: String, available: String },
    /// 缺少 API Key
    #[error("未设置评分器 API Key，请设置 OPENAI_API_KEY 或在配置文件中填写 judge_api_key")]
    MissingApiKey,
    /// 并发数无效
    #[error("并发数必须大于 0")]
    InvalidConcurrency,
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
