use async_trait::async_trait;
use ocr_grader::config::Config;
use ocr_grader::error::JudgeError;
use ocr_grader::models::{GradingResult, Scores, Summary, WorkItem};
use ocr_grader::services::{render, summarize, ExportFormat};
use ocr_grader::{App, Judge, ResultStore};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::assert_ok;

/// 预先编排好每个索引结果的假评分器
struct FakeJudge {
    outcomes: HashMap<usize, Option<Scores>>,
    calls: AtomicUsize,
}

impl FakeJudge {
    fn new(outcomes: Vec<(usize, Option<Scores>)>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: outcomes.into_iter().collect(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Judge for FakeJudge {
    async fn grade(&self, item: &WorkItem) -> Result<GradingResult, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.get(&item.index).copied().flatten() {
            Some(scores) => Ok(GradingResult::Scored {
                index: item.index,
                scores,
            }),
            None => Err(JudgeError::ApiCallFailed {
                model: "fake".to_string(),
                message: "503 Service Unavailable".to_string(),
            }),
        }
    }
}

fn scores(overall: f64, character: f64, word: f64, confidence: f64) -> Scores {
    Scores {
        overall_score: overall,
        character_accuracy: character,
        word_accuracy: word,
        confidence_level: confidence,
    }
}

/// 生成数据集和 OCR 文件；`None` 表示该索引没有 OCR 文件
fn write_inputs(root: &Path, ocr_texts: &[Option<&str>]) -> Config {
    let config = Config {
        output_dir: root.join("results"),
        ocr_dir: root.join("input"),
        ocr_source: "qwen".to_string(),
        ocr_file_suffix: "llamacpp".to_string(),
        dataset_path: root.join("test.jsonl"),
        max_concurrent_items: 3,
        ..Config::default()
    };

    let source_dir = config.ocr_dir.join(&config.ocr_source);
    std::fs::create_dir_all(&source_dir).unwrap();

    let mut dataset = String::new();
    for (index, text) in ocr_texts.iter().enumerate() {
        dataset.push_str(&format!(
            "{{\"id\": {}, \"true_markdown_output\": \"# Page {}\\nSome text.\"}}\n",
            index, index
        ));
        if let Some(text) = text {
            std::fs::write(source_dir.join(format!("{}llamacpp.txt", index)), text).unwrap();
        }
    }
    std::fs::write(&config.dataset_path, dataset).unwrap();
    config
}

#[tokio::test]
async fn test_end_to_end_three_items() {
    let dir = tempfile::tempdir().unwrap();
    // 0: 正常；1: 调用失败；2: OCR 为空
    let config = write_inputs(dir.path(), &[Some("Page 0 Some text."), Some("Page 1"), Some("")]);
    let judge = FakeJudge::new(vec![(0, Some(scores(90.0, 95.0, 92.0, 88.0))), (1, None)]);

    let app = assert_ok!(App::initialize(config.clone(), judge.clone()).await);
    let report = assert_ok!(app.run(false).await);
    let summary = &report.summary;

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.overall_score_stats.mean, 45.0);
    assert_eq!(summary.overall_score_stats.min, 0.0);
    assert_eq!(summary.overall_score_stats.max, 90.0);
    assert_eq!(summary.overall_score_stats.count, 2);
    assert_eq!(summary.score_distribution.buckets().map(|(_, c)| c), [1, 0, 0, 0, 1]);
    assert_eq!(judge.calls(), 2);

    // 磁盘上的产物
    let results: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(config.output_dir.join("grading_results.json")).unwrap(),
    )
    .unwrap();
    let rows = results.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["index"], 0);
    assert_eq!(rows[1]["index"], 2);
    assert_eq!(rows[1]["confidence_level"], 100.0);

    let progress: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(config.output_dir.join("progress.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(progress["total_processed"], 2);
    assert!(progress["last_updated"].is_string());

    let on_disk: Summary = serde_json::from_str(
        &std::fs::read_to_string(config.output_dir.join("summary_report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(&on_disk, summary);

    let html = std::fs::read_to_string(config.output_dir.join("detailed_report.html")).unwrap();
    assert_eq!(html, render(summary));
}

#[tokio::test]
async fn test_resume_matches_uninterrupted_run() {
    let texts = [Some("a"), Some("b"), Some("c"), Some("d")];
    let plan = || {
        vec![
            (0, Some(scores(10.0, 20.0, 30.0, 40.0))),
            (1, Some(scores(50.0, 60.0, 70.0, 80.0))),
            (2, Some(scores(85.0, 90.0, 95.0, 99.0))),
            (3, Some(scores(35.0, 36.0, 37.0, 38.0))),
        ]
    };

    // 一次跑完
    let full_dir = tempfile::tempdir().unwrap();
    let full_config = write_inputs(full_dir.path(), &texts);
    let full = App::initialize(full_config, FakeJudge::new(plan())).await.unwrap();
    full.run(false).await.unwrap();

    // 中途"中断"：第一次只有前两个条目的结果被写入
    let resumed_dir = tempfile::tempdir().unwrap();
    let resumed_config = write_inputs(resumed_dir.path(), &texts);
    let store = ResultStore::open(resumed_config.output_dir.clone()).unwrap();
    store
        .append(GradingResult::Scored {
            index: 0,
            scores: scores(10.0, 20.0, 30.0, 40.0),
        })
        .unwrap();
    store
        .append(GradingResult::Scored {
            index: 1,
            scores: scores(50.0, 60.0, 70.0, 80.0),
        })
        .unwrap();

    let judge = FakeJudge::new(plan());
    let resumed = App::initialize(resumed_config, judge.clone()).await.unwrap();
    let report = resumed.run(true).await.unwrap();

    assert_eq!(report.skipped, 2);
    assert_eq!(judge.calls(), 2);
    assert_eq!(
        resumed.store().load_all().unwrap(),
        full.store().load_all().unwrap()
    );
}

#[tokio::test]
async fn test_rerun_without_resume_does_not_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_inputs(dir.path(), &[Some("x"), Some("y")]);
    let plan = vec![
        (0, Some(scores(70.0, 70.0, 70.0, 70.0))),
        (1, Some(scores(75.0, 75.0, 75.0, 75.0))),
    ];

    for _ in 0..2 {
        let app = App::initialize(config.clone(), FakeJudge::new(plan.clone()))
            .await
            .unwrap();
        app.run(false).await.unwrap();
    }

    let store = ResultStore::open(config.output_dir.clone()).unwrap();
    assert_eq!(store.load_all().unwrap().len(), 2);
    assert_eq!(store.read_progress().unwrap().unwrap().total_processed, 2);
}

#[tokio::test]
async fn test_missing_ocr_file_is_degenerate() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_inputs(dir.path(), &[None, Some("text")]);
    let judge = FakeJudge::new(vec![(1, Some(scores(60.0, 60.0, 60.0, 60.0)))]);

    let app = App::initialize(config, judge.clone()).await.unwrap();
    let report = app.run(false).await.unwrap();

    assert_eq!(report.summary.successful, 2);
    assert_eq!(report.summary.score_distribution.range_0_20, 1);
    assert_eq!(judge.calls(), 1);
}

#[tokio::test]
async fn test_empty_dataset_fails_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_inputs(dir.path(), &[]);
    let judge = FakeJudge::new(vec![]);

    assert!(App::initialize(config.clone(), judge.clone()).await.is_err());
    assert_eq!(judge.calls(), 0);
    assert!(!config.output_dir.join("grading_results.json").exists());
}

#[test]
fn test_append_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = ResultStore::open(dir.path()).unwrap();
        store
            .append(GradingResult::Scored {
                index: 5,
                scores: scores(42.0, 43.0, 44.0, 45.0),
            })
            .unwrap();
        // store 在这里被丢弃，模拟进程退出
    }

    let reopened = ResultStore::open(dir.path()).unwrap();
    let set = reopened.load_all().unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.get(5).and_then(|r| r.scores()).map(|s| s.overall_score), Some(42.0));
    assert!(reopened.export_path(ExportFormat::Csv).exists());

    let summary = summarize(&set, &[]);
    assert_eq!(summary.successful + summary.failed, summary.total_files);
}
