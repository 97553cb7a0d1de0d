/*!
 * Integration tests for the scan, select and encode workflow
 */

use std::path::Path;
use anyhow::Result;
use hbrip::app_config::Config;
use hbrip::app_controller::Controller;
use hbrip::file_utils::MIN_OUTPUT_SIZE_BYTES;
use hbrip::selection::SkipReason;
use crate::common::{self, mock_engine::MockEngine};

fn disc_config(dir: &Path) -> Config {
    Config {
        audio_languages: Some(vec!["deu".to_string()]),
        min_length: Some("00:01:00".to_string()),
        skip_duplicates: true,
        ..common::open_config(dir, "#title#-#pos#.m4v")
    }
}

fn skip_reasons(skipped: &[(u32, SkipReason)]) -> Vec<u32> {
    skipped.iter().map(|(position, _)| *position).collect()
}

/// Test a disc rip encodes the main feature and skips the rest
#[tokio::test]
async fn test_run_withDiscScan_shouldEncodeAcceptedTitles() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new(common::DISC_SCAN);
    let jobs = engine.jobs();

    let controller = Controller::new(disc_config(temp_dir.path()), Box::new(engine));
    let summary = controller.run().await?;

    let expected = temp_dir.path().join("The Movie-01.m4v");
    assert_eq!(summary.encoded, vec![expected.clone()]);
    assert!(expected.exists());
    assert!(summary.failed.is_empty());

    assert_eq!(skip_reasons(&summary.skipped), vec![2, 3, 4]);
    assert_eq!(summary.skipped[0].1, SkipReason::Duplicate { blocks: 2264738 });
    assert!(matches!(summary.skipped[1].1, SkipReason::TooShort { .. }));
    assert!(matches!(summary.skipped[2].1, SkipReason::MissingAudioLanguages { .. }));

    let jobs = jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title, 1);
    assert_eq!(jobs[0].input.to_str(), Some("/dev/dvd"));
    Ok(())
}

/// Test an undersized output is removed and its block count released
#[tokio::test]
async fn test_run_withUndersizedOutput_shouldRemoveFileAndForgetBlocks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new(common::DISC_SCAN).with_output_size(Some(MIN_OUTPUT_SIZE_BYTES / 2));
    let jobs = engine.jobs();

    let controller = Controller::new(disc_config(temp_dir.path()), Box::new(engine));
    let summary = controller.run().await?;

    assert!(summary.encoded.is_empty());
    // Title 2 shares the block count of title 1 and gets its chance
    let failed: Vec<u32> = summary.failed.iter().map(|(position, _)| *position).collect();
    assert_eq!(failed, vec![1, 2]);
    assert_eq!(jobs.lock().unwrap().len(), 2);
    assert!(!temp_dir.path().join("The Movie-01.m4v").exists());
    assert!(!temp_dir.path().join("The Movie-02.m4v").exists());
    Ok(())
}

/// Test a missing output keeps the block count recorded
#[tokio::test]
async fn test_run_withMissingOutput_shouldKeepDuplicateRecord() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new(common::DISC_SCAN).with_output_size(None);
    let jobs = engine.jobs();

    let controller = Controller::new(disc_config(temp_dir.path()), Box::new(engine));
    let summary = controller.run().await?;

    assert!(summary.encoded.is_empty());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.skipped[0].1, SkipReason::Duplicate { blocks: 2264738 });
    assert_eq!(jobs.lock().unwrap().len(), 1);
    Ok(())
}

/// Test a non-zero exit code does not fail a usable output
#[tokio::test]
async fn test_run_withNonZeroExitCode_shouldJudgeByOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new(common::DISC_SCAN).with_exit_code(Some(3));

    let controller = Controller::new(disc_config(temp_dir.path()), Box::new(engine));
    let summary = controller.run().await?;

    assert_eq!(summary.encoded.len(), 1);
    assert!(summary.failed.is_empty());
    Ok(())
}

/// Test dry runs assemble jobs without invoking the engine
#[tokio::test]
async fn test_run_withDryRun_shouldPlanWithoutEncoding() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new(common::DISC_SCAN);
    let jobs = engine.jobs();

    let config = Config {
        dry_run: true,
        ..disc_config(temp_dir.path())
    };
    let controller = Controller::new(config, Box::new(engine));
    let summary = controller.run().await?;

    assert_eq!(summary.planned.len(), 1);
    assert_eq!(summary.planned[0].title, 1);
    assert!(summary.encoded.is_empty());
    assert!(jobs.lock().unwrap().is_empty());
    assert!(!temp_dir.path().join("The Movie-01.m4v").exists());
    Ok(())
}

/// Test inspect mode stops after the scan
#[tokio::test]
async fn test_run_withInspectOnly_shouldNotSelectTitles() -> Result<()> {
    let engine = MockEngine::new(common::DISC_SCAN);
    let jobs = engine.jobs();

    let config = Config {
        input: Some("/dev/dvd".into()),
        inspect_only: true,
        ..Config::default()
    };
    let summary = Controller::new(config, Box::new(engine)).run().await?;

    assert!(summary.skipped.is_empty());
    assert!(summary.planned.is_empty());
    assert!(jobs.lock().unwrap().is_empty());
    Ok(())
}

/// Test a scan without titles ends the run quietly
#[tokio::test]
async fn test_run_withMalformedScan_shouldReturnEmptySummary() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new("HandBrake 1.6.1\nNo title found.\n");

    let controller = Controller::new(disc_config(temp_dir.path()), Box::new(engine));
    let summary = controller.run().await?;

    assert!(summary.encoded.is_empty());
    assert!(summary.skipped.is_empty());
    assert!(summary.failed.is_empty());
    Ok(())
}

/// Test engine failures during the scan abort the run
#[tokio::test]
async fn test_run_withEmptyScanOutput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::new(disc_config(temp_dir.path()), Box::new(MockEngine::new("")));

    let error = controller.run().await.unwrap_err();
    assert!(format!("{:#}", error).contains("Failed to scan"));
    Ok(())
}

/// Test existing outputs are skipped and survive the run
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipTitle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let existing = common::create_test_file(temp_dir.path(), "The Movie-01.mkv", "keep me")?;
    let engine = MockEngine::new(common::DISC_SCAN);
    let jobs = engine.jobs();

    let controller = Controller::new(disc_config(temp_dir.path()), Box::new(engine));
    let summary = controller.run().await?;

    assert_eq!(summary.skipped[0], (1, SkipReason::OutputExists(existing.clone())));
    // Title 2 is no duplicate because title 1 was never accepted
    assert_eq!(summary.encoded, vec![temp_dir.path().join("The Movie-02.m4v")]);
    assert_eq!(jobs.lock().unwrap()[0].title, 2);
    assert_eq!(std::fs::read_to_string(existing)?, "keep me");
    Ok(())
}

/// Test a single-title file is ripped as main feature
#[test]
fn test_run_withFileScanAndMainFeatureOnly_shouldEncodeSingleTitle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new(common::FILE_SCAN);
    let jobs = engine.jobs();

    let config = Config {
        input: Some("/videos/holiday.mkv".into()),
        main_feature_only: true,
        audio_languages: Some(vec!["eng".to_string()]),
        subtitle_languages: Some(vec!["eng".to_string()]),
        ..common::open_config(temp_dir.path(), "#title#.mkv")
    };
    let controller = Controller::new(config, Box::new(engine));
    let summary = tokio_test::block_on(controller.run())?;

    assert_eq!(summary.encoded, vec![temp_dir.path().join("holiday.mkv.mkv")]);
    let jobs = jobs.lock().unwrap();
    let args = jobs[0].to_args();
    assert!(args.windows(2).any(|w| w == ["--audio", "1,1"]));
    // The scan lists no subtitle tracks
    assert!(!args.iter().any(|a| a == "--subtitle"));
    Ok(())
}

/// Test every title of one run shares the same timestamp
#[tokio::test]
async fn test_run_withTimestampPlaceholder_shouldUseOneTimestampPerRun() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = Config {
        titles: Some(vec![1, 4]),
        audio_languages: None,
        ..common::open_config(temp_dir.path(), "#pos#_#ts#.mkv")
    };
    let controller = Controller::new(config, Box::new(MockEngine::new(common::DISC_SCAN)));
    let summary = controller.run().await?;

    assert_eq!(summary.encoded.len(), 2);
    let stamps: Vec<String> = summary.encoded.iter()
        .map(|p| p.file_stem().unwrap().to_string_lossy()[3..].to_string())
        .collect();
    assert_eq!(stamps[0], stamps[1]);
    assert_eq!(stamps[0].len(), "2024-05-01_20_15_00".len());
    Ok(())
}
