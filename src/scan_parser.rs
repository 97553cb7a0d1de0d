use std::path::Path;
use regex::{Captures, Regex};
use once_cell::sync::Lazy;
use log::{debug, trace, warn};
use crate::errors::ScanError;
use crate::media::{AudioTrack, Chapter, Source, Subtitle, Title};

// @module: Interpreter for the diagnostic text of a HandBrake scan

// @const: Source-level patterns
static DVD_TITLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"libdvdnav: DVD Title: (.*)").unwrap()
});
static DVD_ALT_TITLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"libdvdnav: DVD Title \(Alternative\): (.*)").unwrap()
});
static DVD_SERIAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"libdvdnav: DVD Serial Number: (.*)").unwrap()
});
static AUDIO_SECTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ audio tracks:").unwrap()
});
static SUBTITLE_SECTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ subtitles:").unwrap()
});
static TITLE_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ title ([0-9]+):").unwrap()
});

// @const: Title-level patterns
static MAIN_FEATURE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ Main Feature").unwrap()
});
static TITLE_BLOCKS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ vts .*, ttn .*, cells .* \(([0-9]+) blocks\)").unwrap()
});
static TITLE_INFO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ size: ([0-9]+x[0-9]+).*, ([0-9.]+) fps").unwrap()
});
static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ duration: (.*)").unwrap()
});
static CHAPTER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ ([0-9]+): cells (.*), ([0-9]+) blocks, duration (.*)").unwrap()
});
static DISC_AUDIO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ ([0-9]+), (.*?) \(iso639-2: (.*?)\), ([0-9]+Hz), ([0-9]+bps)").unwrap()
});
static FILE_AUDIO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ ([0-9]+), (.*?) \(iso639-2: (.*?)\)").unwrap()
});
static SUBTITLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ ([0-9]+), (.*?) \(iso639-2: (.*?)\)").unwrap()
});

// @const: Parenthesized sub-fields of a track description
static THREE_GROUPS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((.*?)\)\s*\((.*?)\)\s*\((.*?)\)\s*").unwrap()
});
static TWO_GROUPS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((.*?)\)\s*\((.*?)\)\s*").unwrap()
});
static ONE_GROUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((.*?)\)").unwrap()
});

/// Listings opened so far.
///
/// Each header sets its own flag and neither is ever cleared, so once both
/// listings were seen audio patterns take precedence over subtitle patterns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Sections {
    in_audio_section: bool,
    in_subtitle_section: bool,
}

/// Parser for the output of `HandBrakeCLI --scan`
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanParser;

impl ScanParser {
    pub fn new() -> Self {
        ScanParser
    }

    /// Parse the complete scan output of `path` into a [`Source`].
    ///
    /// Unrecognized lines are ignored. Fails with
    /// [`ScanError::MalformedScanOutput`] only if no title header was found.
    pub fn parse<P: AsRef<Path>>(&self, output: &str, path: P) -> Result<Source, ScanError> {
        let mut source = Source::new(path.as_ref());
        let mut sections = Sections::default();
        let mut line_count = 0;

        for line in output.lines() {
            line_count += 1;
            trace!("scan> {}", line);

            Self::apply_source_line(line, &mut source, &mut sections);

            // Title-level facts only once a title is open
            let Some(title) = source.titles.last_mut() else {
                continue;
            };
            Self::apply_title_line(line, title, sections);
        }

        if source.titles.is_empty() {
            return Err(ScanError::MalformedScanOutput {
                path: source.path,
                lines: line_count,
            });
        }

        // A single title is its own main feature
        if source.titles.len() == 1 {
            source.titles[0].main_feature = true;
        }

        debug!("Parsed {} title(s) from scan of {:?}", source.titles.len(), source.path);
        Ok(source)
    }

    // @updates: Source-level facts, section state, new titles
    fn apply_source_line(line: &str, source: &mut Source, sections: &mut Sections) {
        if let Some(caps) = DVD_TITLE_REGEX.captures(line) {
            source.title = Some(group(&caps, 1));
        } else if let Some(caps) = DVD_ALT_TITLE_REGEX.captures(line) {
            source.title_alt = Some(group(&caps, 1));
        } else if let Some(caps) = DVD_SERIAL_REGEX.captures(line) {
            source.serial = Some(group(&caps, 1));
        } else if AUDIO_SECTION_REGEX.is_match(line) {
            sections.in_audio_section = true;
        } else if SUBTITLE_SECTION_REGEX.is_match(line) {
            sections.in_subtitle_section = true;
        } else if let Some(caps) = TITLE_HEADER_REGEX.captures(line) {
            match parse_position(&caps, 1) {
                Some(position) => {
                    debug!("scan match: title {}", position);
                    source.titles.push(Title::new(position));
                }
                None => warn!("Ignoring title header with out of range number: {}", line.trim()),
            }
        }
    }

    // @updates: At most one fact of the open title
    fn apply_title_line(line: &str, title: &mut Title, sections: Sections) {
        if MAIN_FEATURE_REGEX.is_match(line) {
            title.main_feature = true;
        } else if let Some(caps) = TITLE_BLOCKS_REGEX.captures(line) {
            title.blocks = group(&caps, 1).parse().unwrap_or(-1);
        } else if let Some(caps) = TITLE_INFO_REGEX.captures(line) {
            title.size = Some(group(&caps, 1));
            title.fps = Some(group(&caps, 2));
        } else if let Some(caps) = DURATION_REGEX.captures(line) {
            title.duration = Some(group(&caps, 1));
        } else if let Some(caps) = CHAPTER_REGEX.captures(line) {
            if let Some(position) = parse_position(&caps, 1) {
                title.chapters.push(Chapter {
                    position,
                    cells: group(&caps, 2),
                    blocks: group(&caps, 3).parse().unwrap_or(-1),
                    duration: group(&caps, 4),
                });
            }
        } else {
            Self::apply_track_line(line, title, sections);
        }
    }

    // @updates: Audio or subtitle listing of the open title
    fn apply_track_line(line: &str, title: &mut Title, sections: Sections) {
        if sections.in_audio_section {
            if let Some(caps) = DISC_AUDIO_REGEX.captures(line) {
                if let Some(mut track) = Self::audio_track(&caps) {
                    track.sample_rate = Some(group(&caps, 4));
                    track.bit_rate = Some(group(&caps, 5));
                    title.audio_tracks.push(track);
                }
                return;
            }
            if let Some(caps) = FILE_AUDIO_REGEX.captures(line) {
                if let Some(track) = Self::audio_track(&caps) {
                    title.audio_tracks.push(track);
                }
                return;
            }
        }

        if sections.in_subtitle_section {
            if let Some(caps) = SUBTITLE_REGEX.captures(line) {
                if let Some(subtitle) = Self::subtitle(&caps) {
                    title.subtitles.push(subtitle);
                }
            }
        }
    }

    // @creates: Audio track from position, description and language groups
    fn audio_track(caps: &Captures) -> Option<AudioTrack> {
        let position = parse_position(caps, 1)?;
        let description = group(caps, 2);
        let mut track = AudioTrack::new(position, &description);

        let (codec, comment, channels) = Self::split_audio_description(&description);
        track.codec = codec;
        track.comment = comment;
        track.channels = channels;
        track.language = Some(group(caps, 3));

        Some(track)
    }

    // @creates: Subtitle from position, description and language groups
    fn subtitle(caps: &Captures) -> Option<Subtitle> {
        let position = parse_position(caps, 1)?;
        let description = group(caps, 2);
        let mut subtitle = Subtitle::new(position, &description, &group(caps, 3));
        subtitle.comment = ONE_GROUP_REGEX.captures(&description).map(|c| group(&c, 1));
        Some(subtitle)
    }

    /// Split an audio description into (codec, comment, channels).
    ///
    /// Three parenthesized groups assign all three, two groups assign codec and
    /// channels, anything else leaves all three unset.
    pub fn split_audio_description(description: &str) -> (Option<String>, Option<String>, Option<String>) {
        if let Some(caps) = THREE_GROUPS_REGEX.captures(description) {
            (Some(group(&caps, 1)), Some(group(&caps, 2)), Some(group(&caps, 3)))
        } else if let Some(caps) = TWO_GROUPS_REGEX.captures(description) {
            (Some(group(&caps, 1)), None, Some(group(&caps, 2)))
        } else {
            (None, None, None)
        }
    }
}

fn group(caps: &Captures, index: usize) -> String {
    caps.get(index)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn parse_position(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}
