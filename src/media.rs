use std::fmt;
use std::path::{Path, PathBuf};
use crate::time_utils;

// @module: Media model produced by the scan parser

/// Literal used when a source has no usable name, and rejected as a name candidate
pub const UNKNOWN_NAME: &str = "unknown";

/// Common view over audio and subtitle tracks
pub trait Track {
    /// 1-based position within the title
    fn position(&self) -> u32;

    /// ISO 639-2 language code as reported by the scan, if any
    fn language(&self) -> Option<&str>;

    /// Free-text description
    fn description(&self) -> &str;

    /// True if the description mentions a commentary
    fn is_commentary(&self) -> bool {
        self.description().to_lowercase().contains("commentary")
    }
}

// @struct: Chapter of a title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    // @field: 1-based position
    pub position: u32,

    // @field: Cell range, e.g. "0->3"
    pub cells: String,

    // @field: Block count
    pub blocks: i64,

    // @field: Duration (hh:mm:ss)
    pub duration: String,
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}. {} (cells={}, blocks={})", self.position, self.duration, self.cells, self.blocks)
    }
}

// @struct: Audio track of a title
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioTrack {
    pub position: u32,
    pub description: String,
    pub codec: Option<String>,
    pub comment: Option<String>,
    pub channels: Option<String>,
    pub language: Option<String>,
    pub sample_rate: Option<String>,
    pub bit_rate: Option<String>,
}

impl AudioTrack {
    /// Create a track with only position and description set
    pub fn new(position: u32, description: &str) -> Self {
        AudioTrack {
            position,
            description: description.to_string(),
            ..Default::default()
        }
    }
}

impl Track for AudioTrack {
    fn position(&self) -> u32 {
        self.position
    }

    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}. {} (codec={}, channels={}, lang={}, comment={}, rate={}, bitrate={}, commentary={})",
            self.position,
            self.description,
            display_opt(&self.codec),
            display_opt(&self.channels),
            display_opt(&self.language),
            display_opt(&self.comment),
            display_opt(&self.sample_rate),
            display_opt(&self.bit_rate),
            self.is_commentary()
        )
    }
}

// @struct: Subtitle track of a title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitle {
    pub position: u32,
    pub description: String,
    pub language: String,
    pub comment: Option<String>,
}

impl Subtitle {
    pub fn new(position: u32, description: &str, language: &str) -> Self {
        Subtitle {
            position,
            description: description.to_string(),
            language: language.to_string(),
            comment: None,
        }
    }
}

impl Track for Subtitle {
    fn position(&self) -> u32 {
        self.position
    }

    fn language(&self) -> Option<&str> {
        Some(&self.language)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Subtitle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}. {} (lang={}, comment={}, commentary={})",
            self.position,
            self.description,
            self.language,
            display_opt(&self.comment),
            self.is_commentary()
        )
    }
}

/// One selectable program inside a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    /// 1-based position, assigned at creation
    pub position: u32,

    /// Block count, -1 when the scan did not report one
    pub blocks: i64,

    /// Resolution, e.g. "720x576"
    pub size: Option<String>,

    /// Frame rate, e.g. "25.000"
    pub fps: Option<String>,

    /// Duration (hh:mm:ss)
    pub duration: Option<String>,

    /// Main feature flag
    pub main_feature: bool,

    pub chapters: Vec<Chapter>,
    pub audio_tracks: Vec<AudioTrack>,
    pub subtitles: Vec<Subtitle>,
}

impl Title {
    /// Create an empty title at the given position
    pub fn new(position: u32) -> Self {
        Title {
            position,
            blocks: -1,
            size: None,
            fps: None,
            duration: None,
            main_feature: false,
            chapters: Vec::new(),
            audio_tracks: Vec::new(),
            subtitles: Vec::new(),
        }
    }

    /// Duration in seconds, `None` if absent or malformed
    pub fn duration_seconds(&self) -> Option<u64> {
        self.duration
            .as_deref()
            .and_then(|d| time_utils::parse_duration(d).ok())
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let audio_languages: Vec<&str> = self.audio_tracks.iter()
            .map(|t| t.language().unwrap_or(""))
            .collect();
        let subtitle_languages: Vec<&str> = self.subtitles.iter()
            .map(|s| s.language.as_str())
            .collect();

        write!(
            f,
            "title {:02}: {}, {}, {} fps, main-feature: {}, blocks: {}, chapters: {}, audio-tracks: {}, subtitles: {}",
            self.position,
            display_opt(&self.duration),
            display_opt(&self.size),
            display_opt(&self.fps),
            self.main_feature,
            self.blocks,
            self.chapters.len(),
            audio_languages.join(","),
            subtitle_languages.join(",")
        )
    }
}

/// One physical or file-based input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Scanned path
    pub path: PathBuf,

    /// Declared title (e.g. the DVD label)
    pub title: Option<String>,

    /// Alternative declared title
    pub title_alt: Option<String>,

    /// Disc serial number
    pub serial: Option<String>,

    /// Titles in scan order
    pub titles: Vec<Title>,
}

impl Source {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Source {
            path: path.as_ref().to_path_buf(),
            title: None,
            title_alt: None,
            serial: None,
            titles: Vec::new(),
        }
    }

    /// Resolve the name used in output paths.
    ///
    /// Tries the alternative title, the declared title and the path basename in
    /// that order and falls back to [`UNKNOWN_NAME`].
    pub fn name(&self) -> String {
        let basename = self.path.file_name()
            .map(|n| n.to_string_lossy().to_string());

        [self.title_alt.as_deref(), self.title.as_deref(), basename.as_deref()]
            .into_iter()
            .flatten()
            .find(|candidate| is_usable_name(candidate))
            .map(|candidate| candidate.trim().to_string())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    /// Human-readable summary of the source and all of its titles
    pub fn info(&self) -> String {
        let mut s = self.to_string();
        for title in &self.titles {
            s.push_str(&format!("\n{}", title));
            s.push_str("\n  audio-tracks:");
            for track in &title.audio_tracks {
                s.push_str(&format!("\n    {}", track));
            }
            s.push_str("\n  subtitles:");
            for subtitle in &title.subtitles {
                s.push_str(&format!("\n    {}", subtitle));
            }
            s.push_str("\n  chapters:");
            for chapter in &title.chapters {
                s.push_str(&format!("\n    {}", chapter));
            }
        }
        s
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (title={}, title_alt={}, serial={}, name={})",
            self.path.display(),
            display_opt(&self.title),
            display_opt(&self.title_alt),
            display_opt(&self.serial),
            self.name()
        )
    }
}

fn is_usable_name(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    !trimmed.is_empty() && trimmed != UNKNOWN_NAME
}

fn display_opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}
