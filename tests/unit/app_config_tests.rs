/*!
 * Tests for application configuration functionality
 */

use std::path::PathBuf;
use anyhow::Result;
use log::LevelFilter;
use hbrip::app_config::{AudioMode, Config, LogLevel, Profile};
use hbrip::errors::{AppError, JobError};
use crate::common;

fn valid_config(input: PathBuf) -> Config {
    Config {
        input: Some(input),
        output: Some("/tmp/#title#-#pos#.m4v".to_string()),
        ..Config::default()
    }
}

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.handbrake_cli, "HandBrakeCLI");
    assert_eq!(config.audio_languages, Some(vec!["deu".to_string()]));
    assert_eq!(config.subtitle_languages, Some(vec![]));
    assert_eq!(config.titles, None);
    assert_eq!(config.audio_mode, AudioMode::Both);
    assert_eq!(config.ipod_max_bitrate_kbps, 1500);
    assert!(!config.force);
    assert!(!config.dry_run);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test a partial configuration file falls back to defaults
#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "hbrip.json",
        r#"{
            "output": "~/rips/#title#.mkv",
            "audio_languages": ["eng", "deu"],
            "subtitle_languages": null,
            "audio_mode": "copy-only",
            "skip_commentaries": true,
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.output.as_deref(), Some("~/rips/#title#.mkv"));
    assert_eq!(config.audio_languages, Some(vec!["eng".to_string(), "deu".to_string()]));
    assert_eq!(config.subtitle_languages, None);
    assert_eq!(config.audio_mode, AudioMode::CopyOnly);
    assert!(config.skip_commentaries);
    assert_eq!(config.log_level.to_level_filter(), LevelFilter::Debug);
    assert_eq!(config.handbrake_cli, "HandBrakeCLI");
    Ok(())
}

/// Test a broken configuration file is reported
#[test]
fn test_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "hbrip.json", "{ not json")?;

    let error = Config::from_file(&path).unwrap_err();
    assert!(format!("{:#}", error).contains("Failed to parse config file"));
    Ok(())
}

/// Test a complete configuration validates
#[test]
fn test_validate_withValidConfig_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = valid_config(temp_dir.path().to_path_buf());
    config.min_length = Some("00:10:00".to_string());
    config.chapters = Some("3-4".to_string());
    config.x264_preset = Some("slow".to_string());

    assert!(config.validate().is_ok());
    Ok(())
}

/// Test input and output are required
#[test]
fn test_validate_withMissingPaths_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let no_input = Config { input: None, ..valid_config(temp_dir.path().to_path_buf()) };
    assert!(matches!(no_input.validate(), Err(AppError::Config(_))));

    let missing_input = valid_config(temp_dir.path().join("missing.iso"));
    assert!(matches!(missing_input.validate(), Err(AppError::File(_))));

    let no_output = Config { output: None, ..valid_config(temp_dir.path().to_path_buf()) };
    assert!(matches!(no_output.validate(), Err(AppError::Config(_))));

    // Inspecting does not need an output
    let inspect = Config { output: None, inspect_only: true, ..valid_config(temp_dir.path().to_path_buf()) };
    assert!(inspect.validate().is_ok());
    Ok(())
}

/// Test policy errors surface before any scan
#[test]
fn test_validate_withInvalidPolicy_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().to_path_buf();

    let avi = Config { output: Some("/tmp/movie.avi".to_string()), ..valid_config(input.clone()) };
    assert!(matches!(
        avi.validate(),
        Err(AppError::Job(JobError::UnsupportedContainer(ext))) if ext == "avi"
    ));

    let preset = Config { x264_preset: Some("turbo".to_string()), ..valid_config(input.clone()) };
    assert!(matches!(preset.validate(), Err(AppError::Job(JobError::UnknownX264Preset(_)))));

    let length = Config { max_length: Some("50 minutes".to_string()), ..valid_config(input.clone()) };
    assert!(matches!(length.validate(), Err(AppError::Config(_))));

    let chapters = Config { chapters: Some("3-".to_string()), ..valid_config(input) };
    assert!(matches!(chapters.validate(), Err(AppError::Config(_))));
    Ok(())
}

/// Test language allow-lists are normalized to ISO 639-2/T
#[test]
fn test_normalize_languages_withMixedCodes_shouldUseTerminologyCodes() {
    let mut config = Config {
        audio_languages: Some(vec!["de".to_string(), "ENG".to_string(), "ger".to_string()]),
        subtitle_languages: None,
        ..Config::default()
    };
    config.normalize_languages();

    assert_eq!(
        config.audio_languages,
        Some(vec!["deu".to_string(), "eng".to_string(), "deu".to_string()])
    );
    assert_eq!(config.subtitle_languages, None);
}

/// Test duration bounds in seconds
#[test]
fn test_length_seconds_withBounds_shouldConvert() {
    let config = Config {
        min_length: Some("00:10:00".to_string()),
        max_length: Some("01:00:30".to_string()),
        ..Config::default()
    };
    assert_eq!(config.min_length_seconds(), Some(600));
    assert_eq!(config.max_length_seconds(), Some(3630));
    assert_eq!(Config::default().min_length_seconds(), None);
}

/// Test extra arguments are split on whitespace
#[test]
fn test_extra_args_withSpacedArguments_shouldSplit() {
    let config = Config {
        extra_args: Some("  --denoise   weak --deblock ".to_string()),
        ..Config::default()
    };
    assert_eq!(config.extra_args(), vec!["--denoise", "weak", "--deblock"]);
    assert!(Config::default().extra_args().is_empty());
}

/// Test the profiles
#[test]
fn test_profile_apply_withEachProfile_shouldSetShortcuts() {
    let mut config = Config::default();
    Profile::Default.apply(&mut config);
    assert_eq!(config.audio_languages, Some(vec!["deu".to_string(), "eng".to_string()]));
    assert_eq!(config.subtitle_languages, Some(vec!["deu".to_string(), "eng".to_string()]));
    assert_eq!(config.audio_mode, AudioMode::CopyOnly);
    assert!(config.all_tracks_per_language);
    assert!(config.skip_commentaries);
    assert!(!config.main_feature_only);

    let mut movie = Config::default();
    Profile::Movie.apply(&mut movie);
    assert!(movie.main_feature_only);
    assert!(movie.skip_commentaries);

    let mut episodes = Config::default();
    Profile::Episodes.apply(&mut episodes);
    assert_eq!(episodes.min_length.as_deref(), Some("00:10:00"));
    assert_eq!(episodes.max_length.as_deref(), Some("00:50:00"));
    assert!(episodes.skip_duplicates);
    assert!(!episodes.main_feature_only);
}

/// Test the audio mode predicates
#[test]
fn test_audio_mode_withEachMode_shouldReportStreams() {
    assert!(AudioMode::Both.emits_copy() && AudioMode::Both.emits_mixdown());
    assert!(AudioMode::CopyOnly.emits_copy() && !AudioMode::CopyOnly.emits_mixdown());
    assert!(!AudioMode::MixdownOnly.emits_copy() && AudioMode::MixdownOnly.emits_mixdown());
}
