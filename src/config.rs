use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 结果输出目录
    pub output_dir: PathBuf,
    /// OCR 输出根目录
    pub ocr_dir: PathBuf,
    /// OCR 引擎子目录（如 qwen / paddleocr）
    pub ocr_source: String,
    /// OCR 文件名后缀（`<index><suffix>.txt`）
    pub ocr_file_suffix: String,
    /// 数据集文件（JSON 数组或 JSON Lines）
    pub dataset_path: PathBuf,
    /// 同时评分的条目数量
    pub max_concurrent_items: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 评分器（LLM）配置 ---
    pub judge_api_key: String,
    pub judge_api_base_url: String,
    pub judge_model_name: String,
    pub judge_max_retries: usize,
    pub judge_retry_delay_ms: u64,
    /// 单次评分的超时时间（秒），None 表示不限制
    pub judge_timeout_secs: Option<u64>,
    /// 请求 JSON Schema 约束的回复
    pub judge_structured_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./results"),
            ocr_dir: PathBuf::from("./input"),
            ocr_source: "qwen".to_string(),
            ocr_file_suffix: "llamacpp".to_string(),
            dataset_path: PathBuf::from("./dataset/test.jsonl"),
            max_concurrent_items: 1,
            verbose_logging: false,
            judge_api_key: String::new(),
            judge_api_base_url: "https://api.openai.com/v1".to_string(),
            judge_model_name: "gpt-4o-mini-2024-07-18".to_string(),
            judge_max_retries: 3,
            judge_retry_delay_ms: 2000,
            judge_timeout_secs: None,
            judge_structured_output: true,
        }
    }
}

/// TOML 配置文件结构，所有字段均可省略
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    output_dir: Option<PathBuf>,
    ocr_dir: Option<PathBuf>,
    ocr_source: Option<String>,
    ocr_file_suffix: Option<String>,
    dataset_path: Option<PathBuf>,
    max_concurrent_items: Option<usize>,
    verbose_logging: Option<bool>,
    judge_api_key: Option<String>,
    judge_api_base_url: Option<String>,
    judge_model_name: Option<String>,
    judge_max_retries: Option<usize>,
    judge_retry_delay_ms: Option<u64>,
    judge_timeout_secs: Option<u64>,
    judge_structured_output: Option<bool>,
}

impl Config {
    /// 从环境变量加载（未设置或无法解析的变量使用默认值）
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// 从 TOML 文件加载，再由环境变量覆盖
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| {
            ConfigError::TomlParseFailed {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(config.merge_env())
    }

    /// 解析 TOML 文本，未出现的字段保持默认值
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(v) = file.output_dir {
            config.output_dir = v;
        }
        if let Some(v) = file.ocr_dir {
            config.ocr_dir = v;
        }
        if let Some(v) = file.ocr_source {
            config.ocr_source = v;
        }
        if let Some(v) = file.ocr_file_suffix {
            config.ocr_file_suffix = v;
        }
        if let Some(v) = file.dataset_path {
            config.dataset_path = v;
        }
        if let Some(v) = file.max_concurrent_items {
            config.max_concurrent_items = v;
        }
        if let Some(v) = file.verbose_logging {
            config.verbose_logging = v;
        }
        if let Some(v) = file.judge_api_key {
            config.judge_api_key = v;
        }
        if let Some(v) = file.judge_api_base_url {
            config.judge_api_base_url = v;
        }
        if let Some(v) = file.judge_model_name {
            config.judge_model_name = v;
        }
        if let Some(v) = file.judge_max_retries {
            config.judge_max_retries = v;
        }
        if let Some(v) = file.judge_retry_delay_ms {
            config.judge_retry_delay_ms = v;
        }
        if file.judge_timeout_secs.is_some() {
            config.judge_timeout_secs = file.judge_timeout_secs;
        }
        if let Some(v) = file.judge_structured_output {
            config.judge_structured_output = v;
        }

        Ok(config)
    }

    fn merge_env(self) -> Self {
        Self {
            output_dir: env_var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(self.output_dir),
            ocr_dir: env_var("OCR_DIR").map(PathBuf::from).unwrap_or(self.ocr_dir),
            ocr_source: env_var("OCR_SOURCE").unwrap_or(self.ocr_source),
            ocr_file_suffix: env_var("OCR_FILE_SUFFIX").unwrap_or(self.ocr_file_suffix),
            dataset_path: env_var("DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or(self.dataset_path),
            max_concurrent_items: env_parse("MAX_CONCURRENT_ITEMS")
                .unwrap_or(self.max_concurrent_items),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            judge_api_key: env_var("OPENAI_API_KEY").unwrap_or(self.judge_api_key),
            judge_api_base_url: env_var("JUDGE_API_BASE_URL").unwrap_or(self.judge_api_base_url),
            judge_model_name: env_var("JUDGE_MODEL_NAME").unwrap_or(self.judge_model_name),
            judge_max_retries: env_parse("JUDGE_MAX_RETRIES").unwrap_or(self.judge_max_retries),
            judge_retry_delay_ms: env_parse("JUDGE_RETRY_DELAY_MS")
                .unwrap_or(self.judge_retry_delay_ms),
            judge_timeout_secs: env_parse("JUDGE_TIMEOUT_SECS").or(self.judge_timeout_secs),
            judge_structured_output: env_parse("JUDGE_STRUCTURED_OUTPUT")
                .unwrap_or(self.judge_structured_output),
        }
    }

    /// 应用预设（覆盖评分器地址、模型和并发数）
    pub fn apply_preset(&mut self, preset: &Preset) {
        self.judge_api_base_url = preset.api_base_url.to_string();
        self.judge_model_name = preset.model.to_string();
        self.max_concurrent_items = preset.concurrency;
        self.judge_structured_output = preset.structured_output;
    }

    /// 启动前校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_items == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// 未设置或无法解析时返回 None
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.parse().ok())
}

/// 评分预设
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub api_base_url: &'static str,
    pub model: &'static str,
    pub concurrency: usize,
    /// 端点是否支持 JSON Schema 约束的回复
    pub structured_output: bool,
    /// 每 1000 个条目的估算费用（美元）
    pub cost_per_1000: f64,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "fast",
        description: "Fast and cost-effective using GPT-4o-mini",
        api_base_url: "https://api.openai.com/v1",
        model: "gpt-4o-mini",
        concurrency: 10,
        structured_output: true,
        cost_per_1000: 3.0,
    },
    Preset {
        name: "accurate",
        description: "Most accurate using GPT-4o",
        api_base_url: "https://api.openai.com/v1",
        model: "gpt-4o",
        concurrency: 5,
        structured_output: true,
        cost_per_1000: 20.0,
    },
    Preset {
        name: "claude",
        description: "Using Claude Sonnet for analysis",
        api_base_url: "https://api.anthropic.com/v1",
        model: "claude-3-sonnet-20240229",
        concurrency: 5,
        structured_output: false,
        cost_per_1000: 12.0,
    },
    Preset {
        name: "claude-fast",
        description: "Fast Claude Haiku processing",
        api_base_url: "https://api.anthropic.com/v1",
        model: "claude-3-haiku-20240307",
        concurrency: 10,
        structured_output: false,
        cost_per_1000: 2.0,
    },
];

impl Preset {
    /// 按名称查找预设
    pub fn find(name: &str) -> Result<&'static Preset, ConfigError> {
        PRESETS
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::UnknownPreset {
                name: name.to_string(),
                available: PRESETS.iter().map(|p| p.name).collect::<Vec<_>>().join(", "),
            })
    }

    /// 估算处理 `num_items` 个条目的费用
    pub fn estimate_cost(&self, num_items: usize) -> f64 {
        (num_items as f64 / 1000.0) * self.cost_per_1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_overrides_only_given_fields() {
        let config = Config::from_toml_str(
            r#"
            output_dir = "out"
            max_concurrent_items = 4
            judge_timeout_secs = 30
            judge_structured_output = false
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.max_concurrent_items, 4);
        assert_eq!(config.judge_timeout_secs, Some(30));
        assert!(!config.judge_structured_output);
        assert_eq!(config.ocr_source, "qwen");
        assert_eq!(config.judge_max_retries, 3);
    }

    #[test]
    fn test_toml_rejects_wrong_types() {
        assert!(Config::from_toml_str("max_concurrent_items = \"many\"").is_err());
    }

    #[test]
    fn test_preset_lookup_and_cost() {
        let preset = Preset::find("accurate").unwrap();
        assert_eq!(preset.model, "gpt-4o");
        assert!((preset.estimate_cost(500) - 10.0).abs() < 1e-9);

        let err = Preset::find("nope").unwrap_err();
        assert!(err.to_string().contains("claude-fast"));
    }

    #[test]
    fn test_apply_preset_and_validate() {
        let mut config = Config::default();
        config.apply_preset(Preset::find("claude-fast").unwrap());
        assert_eq!(config.max_concurrent_items, 10);
        assert_eq!(config.judge_model_name, "claude-3-haiku-20240307");
        assert!(!config.judge_structured_output);
        assert!(config.validate().is_ok());

        config.max_concurrent_items = 0;
        assert!(config.validate().is_err());
    }
}
