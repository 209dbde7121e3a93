use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use ocr_grader::cli::{Cli, Commands, GradeArgs, ReportArgs};
use ocr_grader::config::Preset;
use ocr_grader::error::ConfigError;
use ocr_grader::utils::logging;
use ocr_grader::{finalize, App, LlmJudge, ResultStore};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Grade(args) if args.verbose);
    logging::init(verbose);

    let result = match cli.command {
        Commands::Grade(args) => grade(args).await,
        Commands::Report(args) => report(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            ExitCode::FAILURE
        }
    }
}

async fn grade(args: GradeArgs) -> Result<()> {
    let (config, preset) = args.resolve().context("配置加载失败")?;

    if !args.estimate_only && config.judge_api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey.into());
    }

    let judge = Arc::new(LlmJudge::new(&config));
    let app = App::initialize(config, judge)
        .await
        .context("初始化失败")?;

    if args.estimate_only {
        let preset = match preset {
            Some(preset) => preset,
            None => Preset::find("fast")?,
        };
        app.estimate(preset, args.resume)?;
        return Ok(());
    }

    let report = app.run(args.resume).await.context("评分运行失败")?;
    info!(
        "🎉 评分完成: 调度 {} 个, 跳过 {} 个, 调用失败 {} 个",
        report.dispatched,
        report.skipped,
        report.failed_indices.len()
    );
    Ok(())
}

fn report(args: ReportArgs) -> Result<()> {
    let config = args.resolve().context("配置加载失败")?;
    let store = ResultStore::open(config.output_dir.clone())?;
    finalize(&store, &[]).context("生成报告失败")?;
    Ok(())
}
