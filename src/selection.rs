/*!
 * Title selection pipeline.
 *
 * Every title of a source passes a fixed sequence of gates; the first failing
 * gate skips the title without affecting the others:
 *
 * 1. position allow-list and main-feature policy
 * 2. duration bounds
 * 3. audio language completeness
 * 4. duplicate block count
 * 5. output path collision
 */

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;
use log::debug;
use crate::app_config::Config;
use crate::errors::EncodeError;
use crate::file_utils::FileManager;
use crate::matcher::ValueMatcher;
use crate::media::{AudioTrack, Source, Subtitle, Title, Track};
use crate::time_utils::format_duration;

/// Why a title was not ripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Position not in the title allow-list
    NotSelected,
    /// Main feature only, and this title is not the main feature
    NotMainFeature,
    /// Shorter than the minimum length (or of unknown length)
    TooShort { duration: Option<u64>, minimum: u64 },
    /// Longer than the maximum length
    TooLong { duration: u64, maximum: u64 },
    /// Not every requested audio language is available
    MissingAudioLanguages { available: Vec<String> },
    /// Same block count as a title already ripped in this run
    Duplicate { blocks: i64 },
    /// Output (or a sibling with the same stem) already exists
    OutputExists(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotSelected => write!(f, "title is not selected"),
            Self::NotMainFeature => write!(f, "title is not the main feature"),
            Self::TooShort { duration, minimum } => write!(
                f,
                "duration is too short ({} < {})",
                duration.map(format_duration).unwrap_or_else(|| "unknown".to_string()),
                format_duration(*minimum)
            ),
            Self::TooLong { duration, maximum } => write!(
                f,
                "duration is too long ({} > {})",
                format_duration(*duration),
                format_duration(*maximum)
            ),
            Self::MissingAudioLanguages { available } => write!(
                f,
                "it does not contain all wanted audio-tracks (available: {})",
                available.join(",")
            ),
            Self::Duplicate { blocks } => write!(f, "source contains it twice ({} blocks)", blocks),
            Self::OutputExists(path) => write!(f, "{:?} already exists", path),
        }
    }
}

/// An accepted title with everything the job assembler needs
#[derive(Debug, Clone)]
pub struct TitleSelection<'a> {
    pub title: &'a Title,
    /// Rendered output path
    pub output_path: PathBuf,
    /// Audio tracks in language priority order
    pub audio_tracks: Vec<&'a AudioTrack>,
    /// Subtitles in language priority order
    pub subtitles: Vec<&'a Subtitle>,
}

/// Result of running a title through the gates
#[derive(Debug, Clone)]
pub enum TitleDecision<'a> {
    Accepted(TitleSelection<'a>),
    Skipped(SkipReason),
}

/// Block counts of titles accepted in the current run
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    accepted: HashSet<i64>,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted title. Unknown block counts (< 0) are not recorded.
    pub fn record(&mut self, blocks: i64) {
        if blocks >= 0 {
            self.accepted.insert(blocks);
        }
    }

    /// Undo a record, e.g. when the encode turned out to be unusable
    pub fn forget(&mut self, blocks: i64) {
        self.accepted.remove(&blocks);
    }

    pub fn contains(&self, blocks: i64) -> bool {
        blocks >= 0 && self.accepted.contains(&blocks)
    }
}

/// Applies the selection gates of a configuration to titles
#[derive(Debug)]
pub struct TitleSelector<'a> {
    config: &'a Config,
    title_matcher: ValueMatcher<Title, u32>,
    audio_matcher: ValueMatcher<AudioTrack, String>,
    subtitle_matcher: ValueMatcher<Subtitle, String>,
}

impl<'a> TitleSelector<'a> {
    pub fn new(config: &'a Config) -> Self {
        TitleSelector {
            config,
            title_matcher: ValueMatcher::by_position(config.titles.clone()),
            audio_matcher: ValueMatcher::by_language(config.audio_languages.clone()),
            subtitle_matcher: ValueMatcher::by_language(config.subtitle_languages.clone()),
        }
    }

    /// Run one title through all gates.
    ///
    /// `timestamp` is the run timestamp substituted into the output template.
    pub fn evaluate<'s>(
        &self,
        source: &'s Source,
        title: &'s Title,
        tracker: &DuplicateTracker,
        timestamp: &str,
    ) -> TitleDecision<'s> {
        let config = self.config;

        if !self.title_matcher.matches(title) {
            return TitleDecision::Skipped(SkipReason::NotSelected);
        }
        if config.main_feature_only && !title.main_feature {
            return TitleDecision::Skipped(SkipReason::NotMainFeature);
        }

        let duration = title.duration_seconds();
        if let Some(minimum) = config.min_length_seconds() {
            if duration.is_none_or(|d| d < minimum) {
                return TitleDecision::Skipped(SkipReason::TooShort { duration, minimum });
            }
        }
        if let (Some(maximum), Some(duration)) = (config.max_length_seconds(), duration) {
            if duration > maximum {
                return TitleDecision::Skipped(SkipReason::TooLong { duration, maximum });
            }
        }

        let dedup = !config.all_tracks_per_language;
        let audio_tracks = self.audio_matcher.filter(&title.audio_tracks, false, dedup);
        if audio_tracks.is_empty() || !self.covers_requested_languages(&audio_tracks) {
            let available = title.audio_tracks.iter()
                .map(|t| t.language().unwrap_or_default().to_string())
                .collect();
            return TitleDecision::Skipped(SkipReason::MissingAudioLanguages { available });
        }
        let subtitles = self.subtitle_matcher.filter(&title.subtitles, false, dedup);

        if config.skip_duplicates && tracker.contains(title.blocks) {
            return TitleDecision::Skipped(SkipReason::Duplicate { blocks: title.blocks });
        }

        let output_path = FileManager::render_output_path(
            config.output.as_deref().unwrap_or_default(),
            title,
            &source.name(),
            timestamp,
        );
        if !config.force {
            if let Err(EncodeError::OutputAlreadyExists(existing)) = FileManager::check_output_free(&output_path) {
                return TitleDecision::Skipped(SkipReason::OutputExists(existing));
            }
        }

        debug!("Accepted {} with {} audio-track(s) and {} subtitle(s)", title, audio_tracks.len(), subtitles.len());
        TitleDecision::Accepted(TitleSelection {
            title,
            output_path,
            audio_tracks,
            subtitles,
        })
    }

    // @checks: Every distinct requested language has at least one track
    fn covers_requested_languages(&self, tracks: &[&AudioTrack]) -> bool {
        let Some(requested) = self.audio_matcher.allowed() else {
            return true;
        };

        let requested: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
        let covered: BTreeSet<&str> = tracks.iter()
            .filter_map(|t| t.language())
            .filter(|lang| requested.contains(lang))
            .collect();

        covered.len() == requested.len()
    }
}
