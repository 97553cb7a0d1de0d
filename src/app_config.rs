use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use regex::Regex;
use once_cell::sync::Lazy;
use log::LevelFilter;
use crate::errors::AppError;
use crate::job::{self, Container};
use crate::language_utils;
use crate::time_utils;

// Application configuration module
// This module holds the encoding policy: which titles and tracks to keep and
// how the engine is asked to encode them. Values come from an optional JSON
// file and are overridden by command line flags.

// @const: Chapter selection accepted by the engine ("3" or "3-4")
static CHAPTERS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]+(-[0-9]+)?$").unwrap()
});

/// Represents the encoding policy of a run
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Input source (disc device, image, directory or file)
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Output path template, see [`crate::file_utils::FileManager::render_output_path`]
    #[serde(default)]
    pub output: Option<String>,

    /// HandBrakeCLI binary
    #[serde(default = "default_handbrake_cli")]
    pub handbrake_cli: String,

    /// Title positions to rip, `None` for all
    #[serde(default)]
    pub titles: Option<Vec<u32>>,

    /// Audio languages in priority order, `None` for all
    #[serde(default = "default_audio_languages")]
    pub audio_languages: Option<Vec<String>>,

    /// Subtitle languages in priority order, `None` for all
    #[serde(default = "default_subtitle_languages")]
    pub subtitle_languages: Option<Vec<String>>,

    /// Only rip the title flagged as main feature
    #[serde(default)]
    pub main_feature_only: bool,

    /// Minimum title length (hh:mm:ss)
    #[serde(default)]
    pub min_length: Option<String>,

    /// Maximum title length (hh:mm:ss)
    #[serde(default)]
    pub max_length: Option<String>,

    /// Chapter selection passed to the engine ("2" or "3-4")
    #[serde(default)]
    pub chapters: Option<String>,

    /// Overwrite existing outputs
    #[serde(default)]
    pub force: bool,

    /// Skip titles whose block count was already ripped in this run
    #[serde(default)]
    pub skip_duplicates: bool,

    /// Keep every track of a wanted language instead of only the first
    #[serde(default)]
    pub all_tracks_per_language: bool,

    /// Drop commentary audio and subtitle tracks
    #[serde(default)]
    pub skip_commentaries: bool,

    /// Which audio streams to emit per track
    #[serde(default)]
    pub audio_mode: AudioMode,

    /// Constrain the video stream for iPod playback (mp4/m4v only)
    #[serde(default)]
    pub ipod_compatibility: bool,

    /// VBV ceiling in kbit/s used by iPod compatibility
    #[serde(default = "default_ipod_max_bitrate_kbps")]
    pub ipod_max_bitrate_kbps: u32,

    /// Let the engine crop black bars
    #[serde(default)]
    pub autocrop: bool,

    /// Named engine preset; replaces all manual audio and video tuning
    #[serde(default)]
    pub preset: Option<String>,

    /// x264 preset name, see [`crate::job::X264_PRESET_NAMES`]
    #[serde(default)]
    pub x264_preset: Option<String>,

    /// Additional engine arguments, whitespace separated
    #[serde(default)]
    pub extra_args: Option<String>,

    /// Assemble and log jobs without running the engine
    #[serde(default)]
    pub dry_run: bool,

    /// Print the scanned titles and tracks instead of ripping
    #[serde(default)]
    pub inspect_only: bool,

    /// Pass --verbose to the engine
    #[serde(default)]
    pub engine_verbose: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Audio streams emitted for every selected track
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AudioMode {
    // @mode: Passthrough and stereo mixdown
    #[default]
    Both,
    // @mode: Passthrough only
    CopyOnly,
    // @mode: Stereo mixdown only
    MixdownOnly,
}

impl AudioMode {
    pub fn emits_copy(&self) -> bool {
        matches!(self, Self::Both | Self::CopyOnly)
    }

    pub fn emits_mixdown(&self) -> bool {
        matches!(self, Self::Both | Self::MixdownOnly)
    }
}

/// Named shortcuts for common rip setups
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// German and English audio and subtitles, original tracks only, no commentaries
    Default,
    /// `Default` restricted to the main feature
    Movie,
    /// `Default` for 10 to 50 minute episodes, skipping duplicates
    Episodes,
}

impl Profile {
    /// Apply the profile settings to a configuration
    pub fn apply(&self, config: &mut Config) {
        config.audio_languages = Some(vec!["deu".to_string(), "eng".to_string()]);
        config.subtitle_languages = Some(vec!["deu".to_string(), "eng".to_string()]);
        config.audio_mode = AudioMode::CopyOnly;
        config.all_tracks_per_language = true;
        config.skip_commentaries = true;

        match self {
            Self::Default => {}
            Self::Movie => {
                config.main_feature_only = true;
            }
            Self::Episodes => {
                config.min_length = Some("00:10:00".to_string());
                config.max_length = Some("00:50:00".to_string());
                config.skip_duplicates = true;
            }
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_handbrake_cli() -> String {
    "HandBrakeCLI".to_string()
}

fn default_audio_languages() -> Option<Vec<String>> {
    Some(vec!["deu".to_string()])
}

fn default_subtitle_languages() -> Option<Vec<String>> {
    Some(Vec::new())
}

fn default_ipod_max_bitrate_kbps() -> u32 {
    // Apple's H.264 limit for iPod video playback
    1500
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values.
    ///
    /// Everything that would abort a run is checked here, before the source is
    /// scanned.
    pub fn validate(&self) -> Result<(), AppError> {
        let input = self.input.as_ref()
            .ok_or_else(|| AppError::Config("input not set".to_string()))?;
        if !input.exists() {
            return Err(AppError::File(format!("{:?} does not exist", input)));
        }

        if !self.inspect_only {
            let output = self.output.as_deref()
                .ok_or_else(|| AppError::Config("output not set".to_string()))?;
            Container::from_path(Path::new(output))?;
        }

        if let Some(name) = &self.x264_preset {
            job::x264_tuning(name)?;
        }

        for bound in [&self.min_length, &self.max_length].into_iter().flatten() {
            time_utils::parse_duration(bound)
                .map_err(|e| AppError::Config(format!("invalid length bound: {}", e)))?;
        }

        if let Some(chapters) = &self.chapters {
            if !CHAPTERS_REGEX.is_match(chapters) {
                return Err(AppError::Config(format!("invalid chapter selection: {}", chapters)));
            }
        }

        Ok(())
    }

    /// Normalize the language allow-lists to ISO 639-2/T codes
    pub fn normalize_languages(&mut self) {
        if let Some(languages) = &self.audio_languages {
            self.audio_languages = Some(language_utils::normalize_allow_list(languages));
        }
        if let Some(languages) = &self.subtitle_languages {
            self.subtitle_languages = Some(language_utils::normalize_allow_list(languages));
        }
    }

    /// Minimum length in seconds
    pub fn min_length_seconds(&self) -> Option<u64> {
        self.min_length.as_deref().and_then(|t| time_utils::parse_duration(t).ok())
    }

    /// Maximum length in seconds
    pub fn max_length_seconds(&self) -> Option<u64> {
        self.max_length.as_deref().and_then(|t| time_utils::parse_duration(t).ok())
    }

    /// Extra engine arguments split on whitespace
    pub fn extra_args(&self) -> Vec<String> {
        self.extra_args.as_deref()
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            input: None,
            output: None,
            handbrake_cli: default_handbrake_cli(),
            titles: None,
            audio_languages: default_audio_languages(),
            subtitle_languages: default_subtitle_languages(),
            main_feature_only: false,
            min_length: None,
            max_length: None,
            chapters: None,
            force: false,
            skip_duplicates: false,
            all_tracks_per_language: false,
            skip_commentaries: false,
            audio_mode: AudioMode::default(),
            ipod_compatibility: false,
            ipod_max_bitrate_kbps: default_ipod_max_bitrate_kbps(),
            autocrop: false,
            preset: None,
            x264_preset: None,
            extra_args: None,
            dry_run: false,
            inspect_only: false,
            engine_verbose: false,
            log_level: LogLevel::default(),
        }
    }
}
