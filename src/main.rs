// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use log::{error, warn, info, debug, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use hbrip::app_config::{self, AudioMode, Config, Profile};
use hbrip::app_controller::Controller;
use hbrip::job::X264_PRESET_NAMES;

/// CLI Wrapper for Profile to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProfile {
    /// --audio deu,eng --subtitles deu,eng --copy-only --all-tracks-per-language --skip-commentaries
    Default,
    /// default + --main
    Movie,
    /// default + --min-length 00:10:00 --max-length 00:50:00 --skip-duplicates
    Episodes,
}

impl From<CliProfile> for Profile {
    fn from(cli_profile: CliProfile) -> Self {
        match cli_profile {
            CliProfile::Default => Profile::Default,
            CliProfile::Movie => Profile::Movie,
            CliProfile::Episodes => Profile::Episodes,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for hbrip
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// hbrip - rip DVDs and video files with HandBrakeCLI
#[derive(Parser, Debug)]
#[command(name = "hbrip")]
#[command(version)]
#[command(about = "Select titles and tracks of a source and encode them with HandBrakeCLI")]
#[command(long_about = "hbrip scans a DVD, disc image or video file with HandBrakeCLI, selects the
titles and audio/subtitle tracks matching the policy and encodes each of them.

EXAMPLES:
    hbrip --input /dev/dvd --check                              # Show titles and tracks
    hbrip --input /dev/dvd --output ~/#title#.m4v --main        # Rip the main feature
    hbrip --input movie.iso --output '#title#-#pos#.mkv' --audio deu,eng --subtitles deu
    hbrip --input /dev/dvd --output '~/tv/#title#-#pos#.mkv' --profile episodes
    hbrip completions bash > hbrip.bash                         # Generate bash completions

OUTPUT PLACEHOLDERS:
    #pos#    title position (two digits)
    #size#   title resolution
    #fps#    title frame rate
    #ts#     timestamp of the run
    #title#  source name

CONFIGURATION:
    Options can be stored in hbrip.json (or the file given with --config).
    Command line flags override the file, a profile is applied before both.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source (device, image, directory or file)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file template (mp4, m4v and mkv supported)
    #[arg(short, long)]
    output: Option<String>,

    /// Force override of existing files
    #[arg(short, long)]
    force: bool,

    /// Show only available titles and tracks
    #[arg(long)]
    check: bool,

    /// Enable iPod compatible output
    #[arg(long, alias = "ipod")]
    compatibility: bool,

    /// Automatically crop black bars
    #[arg(long)]
    autocrop: bool,

    /// Audio languages in priority order
    #[arg(short, long, value_delimiter = ',')]
    audio: Option<Vec<String>>,

    /// Subtitle languages in priority order
    #[arg(short, long, value_delimiter = ',')]
    subtitles: Option<Vec<String>>,

    /// Create only the mixed down track (Dolby ProLogic 2)
    #[arg(long, conflicts_with = "copy_only")]
    mixdown_only: bool,

    /// Copy only the original audio track
    #[arg(long)]
    copy_only: bool,

    /// HandBrake preset to use
    #[arg(short, long)]
    preset: Option<String>,

    /// Main feature only
    #[arg(short, long)]
    main: bool,

    /// Title numbers to rip (use --check to see available titles)
    #[arg(short, long, value_delimiter = ',')]
    titles: Option<Vec<u32>>,

    /// Chapters to rip (e.g. 2 or 3-4)
    #[arg(short, long)]
    chapters: Option<String>,

    /// Minimum title length (hh:mm:ss)
    #[arg(long, value_name = "DURATION")]
    min_length: Option<String>,

    /// Maximum title length (hh:mm:ss)
    #[arg(long, value_name = "DURATION")]
    max_length: Option<String>,

    /// Skip duplicate titles (compares block counts)
    #[arg(long)]
    skip_duplicates: bool,

    /// Convert every found track per language (default is only the first)
    #[arg(long)]
    all_tracks_per_language: bool,

    /// Ignore commentary audio and subtitle tracks
    #[arg(long)]
    skip_commentaries: bool,

    /// Additional arguments for HandBrakeCLI
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    xtra: Option<String>,

    /// Print the commands without starting the conversion
    #[arg(long)]
    dry_run: bool,

    /// Pass --verbose to HandBrakeCLI
    #[arg(short, long)]
    verbose: bool,

    /// x264 preset to use
    #[arg(long, alias = "x264preset", value_parser = X264_PRESET_NAMES)]
    x264_preset: Option<String>,

    /// Apply a predefined set of options
    #[arg(long, value_enum)]
    profile: Option<CliProfile>,

    /// HandBrakeCLI binary
    #[arg(long, env = "HANDBRAKE_CLI")]
    handbrake_cli: Option<String>,

    /// Configuration file path
    #[arg(long, default_value = "hbrip.json")]
    config: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

impl CommandLineOptions {
    // @applies: Explicit flags on top of the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input = Some(input.clone());
        }
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        if let Some(audio) = &self.audio {
            config.audio_languages = Some(audio.clone());
        }
        if let Some(subtitles) = &self.subtitles {
            config.subtitle_languages = Some(subtitles.clone());
        }
        if let Some(titles) = &self.titles {
            config.titles = Some(titles.clone());
        }
        if self.chapters.is_some() {
            config.chapters = self.chapters.clone();
        }
        if self.min_length.is_some() {
            config.min_length = self.min_length.clone();
        }
        if self.max_length.is_some() {
            config.max_length = self.max_length.clone();
        }
        if self.preset.is_some() {
            config.preset = self.preset.clone();
        }
        if self.x264_preset.is_some() {
            config.x264_preset = self.x264_preset.clone();
        }
        if self.xtra.is_some() {
            config.extra_args = self.xtra.clone();
        }
        if let Some(binary) = &self.handbrake_cli {
            config.handbrake_cli = binary.clone();
        }
        if self.mixdown_only {
            config.audio_mode = AudioMode::MixdownOnly;
        }
        if self.copy_only {
            config.audio_mode = AudioMode::CopyOnly;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone().into();
        }

        config.force |= self.force;
        config.inspect_only |= self.check;
        config.ipod_compatibility |= self.compatibility;
        config.autocrop |= self.autocrop;
        config.main_feature_only |= self.main;
        config.skip_duplicates |= self.skip_duplicates;
        config.all_tracks_per_language |= self.all_tracks_per_language;
        config.skip_commentaries |= self.skip_commentaries;
        config.dry_run |= self.dry_run;
        config.engine_verbose |= self.verbose;
    }
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                color, now, record.level(), record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The filter is raised to trace so the max level alone decides what is shown
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "hbrip", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(log_level) = &cli.log_level {
        let level: app_config::LogLevel = log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    let mut config = load_config(&cli.config)?;

    if let Some(profile) = &cli.profile {
        Profile::from(profile.clone()).apply(&mut config);
    }
    cli.apply_to(&mut config);
    log::set_max_level(config.log_level.to_level_filter());

    config.validate()
        .context("Configuration validation failed")?;
    config.normalize_languages();
    debug!("Effective configuration: {:?}", config);

    let controller = Controller::with_config(config);
    let summary = controller.run().await?;

    if !summary.failed.is_empty() {
        warn!("{} title(s) failed", summary.failed.len());
    }
    info!("done");
    Ok(())
}

// @loads: Configuration file if present, defaults otherwise
fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        debug!("Loading configuration from {}", path);
        Config::from_file(path)
    } else {
        debug!("No configuration file at '{}', using defaults", path);
        Ok(Config::default())
    }
}
