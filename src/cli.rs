use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Config, Preset};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "ocr-grader",
    version,
    about = "Grade OCR output against ground truth with an LLM judge"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 评分全部条目并生成报告
    Grade(GradeArgs),
    /// 只根据已有结果重新生成汇总和报告
    Report(ReportArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct GradeArgs {
    /// TOML 配置文件
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 预设: fast / accurate / claude / claude-fast
    #[arg(long)]
    pub preset: Option<String>,

    #[arg(long)]
    pub dataset: Option<PathBuf>,

    #[arg(long)]
    pub ocr_dir: Option<PathBuf>,

    #[arg(long)]
    pub ocr_source: Option<String>,

    #[arg(long)]
    pub ocr_suffix: Option<String>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// 跳过已评分的索引
    #[arg(long, default_value_t = false)]
    pub resume: bool,

    #[arg(long)]
    pub concurrency: Option<usize>,

    /// 单次评分超时（秒）
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// 只估算费用，不评分
    #[arg(long, default_value_t = false)]
    pub estimate_only: bool,

    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// 默认值 < 配置文件 < 环境变量
pub fn base_config(path: Option<&PathBuf>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::from_toml_file(path),
        None => Ok(Config::from_env()),
    }
}

impl GradeArgs {
    /// 合并配置，预设和命令行参数优先级最高
    pub fn resolve(&self) -> Result<(Config, Option<&'static Preset>), ConfigError> {
        let mut config = base_config(self.config.as_ref())?;

        let preset = match &self.preset {
            Some(name) => {
                let preset = Preset::find(name)?;
                config.apply_preset(preset);
                Some(preset)
            }
            None => None,
        };

        if let Some(v) = &self.dataset {
            config.dataset_path = v.clone();
        }
        if let Some(v) = &self.ocr_dir {
            config.ocr_dir = v.clone();
        }
        if let Some(v) = &self.ocr_source {
            config.ocr_source = v.clone();
        }
        if let Some(v) = &self.ocr_suffix {
            config.ocr_file_suffix = v.clone();
        }
        if let Some(v) = &self.output_dir {
            config.output_dir = v.clone();
        }
        if let Some(v) = self.concurrency {
            config.max_concurrent_items = v;
        }
        if self.timeout_secs.is_some() {
            config.judge_timeout_secs = self.timeout_secs;
        }
        if self.verbose {
            config.verbose_logging = true;
        }

        config.validate()?;
        Ok((config, preset))
    }
}

impl ReportArgs {
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let mut config = base_config(self.config.as_ref())?;
        if let Some(v) = &self.output_dir {
            config.output_dir = v.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grade_flags() {
        let cli = Cli::try_parse_from([
            "ocr-grader",
            "grade",
            "--resume",
            "--output-dir",
            "out",
            "--concurrency",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Grade(args) => {
                assert!(args.resume);
                assert_eq!(args.output_dir, Some(PathBuf::from("out")));
                assert_eq!(args.concurrency, Some(3));
                assert!(!args.estimate_only);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_preset() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("grader.toml");
        std::fs::write(&config_path, "ocr_source = \"tesseract\"\n").unwrap();

        let args = GradeArgs {
            config: Some(config_path),
            preset: Some("accurate".to_string()),
            concurrency: Some(2),
            ..GradeArgs::default()
        };
        let (config, preset) = args.resolve().unwrap();

        assert_eq!(preset.map(|p| p.name), Some("accurate"));
        assert_eq!(config.judge_model_name, "gpt-4o");
        assert_eq!(config.max_concurrent_items, 2);
        assert_eq!(config.ocr_source, "tesseract");
    }

    #[test]
    fn test_unknown_preset_and_zero_concurrency_fail() {
        let args = GradeArgs {
            preset: Some("turbo".to_string()),
            ..GradeArgs::default()
        };
        assert!(matches!(args.resolve(), Err(ConfigError::UnknownPreset { .. })));

        let args = GradeArgs {
            concurrency: Some(0),
            ..GradeArgs::default()
        };
        assert!(matches!(args.resolve(), Err(ConfigError::InvalidConcurrency)));
    }
}
