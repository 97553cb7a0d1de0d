/*!
 * Encode job assembly.
 *
 * Turns an accepted title plus the encoding policy into an [`EncodeJob`]: a
 * complete description of one engine invocation. Jobs are plain data; the
 * engine decides how to run them and [`EncodeJob::to_args`] gives the
 * HandBrakeCLI argument list.
 */

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use once_cell::sync::Lazy;
use log::debug;
use crate::app_config::Config;
use crate::errors::JobError;
use crate::media::{AudioTrack, Source, Track};
use crate::selection::TitleSelection;

/// Names accepted as x264 preset, fastest first
pub const X264_PRESET_NAMES: [&str; 10] = [
    "ultrafast", "superfast", "veryfast", "faster", "fast",
    "medium", "slow", "slower", "veryslow", "placebo",
];

// @const: x264 option strings per preset ("medium" is the encoder default)
static X264_PRESETS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ultrafast", "ref=1:bframes=0:cabac=0:8x8dct=0:weightp=0:me=dia:subq=0:rc-lookahead=0:mbtree=0:analyse=none:trellis=0:aq-mode=0:scenecut=0:no-deblock=1"),
        ("superfast", "ref=1:weightp=1:me=dia:subq=1:rc-lookahead=0:mbtree=0:analyse=i4x4,i8x8:trellis=0"),
        ("veryfast", "ref=1:weightp=1:subq=2:rc-lookahead=10:trellis=0"),
        ("faster", "ref=2:mixed-refs=0:weightp=1:subq=4:rc-lookahead=20"),
        ("fast", "ref=2:weightp=1:subq=6:rc-lookahead=30"),
        ("medium", ""),
        ("slow", "ref=5:b-adapt=2:direct=auto:me=umh:subq=8:rc-lookahead=50"),
        ("slower", "ref=8:b-adapt=2:direct=auto:me=umh:subq=9:rc-lookahead=60:analyse=all:trellis=2"),
        ("veryslow", "ref=16:bframes=8:b-adapt=2:direct=auto:me=umh:merange=24:subq=10:rc-lookahead=60:analyse=all:trellis=2"),
        ("placebo", "ref=16:bframes=16:b-adapt=2:direct=auto:me=tesa:merange=24:subq=10:rc-lookahead=60:analyse=all:trellis=2:no-fast-pskip=1"),
    ])
});

pub const VIDEO_ENCODER: &str = "x264";
pub const VIDEO_QUALITY: &str = "20.0";
pub const MIXDOWN_ENCODER: &str = "av_aac";
pub const MIXDOWN_MODE: &str = "dpl2";
pub const MIXDOWN_BITRATE: &str = "160";
const COPY_ENCODER: &str = "copy";
const AUTO: &str = "auto";
const IPOD_VBV_BUFSIZE: u32 = 2500;
const MODULUS: u32 = 16;

/// Look up the x264 option string of a preset
pub fn x264_tuning(name: &str) -> Result<&'static str, JobError> {
    X264_PRESETS.get(name)
        .copied()
        .ok_or_else(|| JobError::UnknownX264Preset(name.to_string()))
}

/// Output container, derived from the output extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// `.mp4` or `.m4v`
    Mp4,
    /// `.mkv`
    Mkv,
}

impl Container {
    pub fn from_path(path: &Path) -> Result<Self, JobError> {
        let ext = path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "mp4" | "m4v" => Ok(Self::Mp4),
            "mkv" => Ok(Self::Mkv),
            _ => Err(JobError::UnsupportedContainer(ext)),
        }
    }

    /// Engine format name
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Mp4 => "av_mp4",
            Self::Mkv => "av_mkv",
        }
    }
}

/// One output audio stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioStream {
    /// Source track position
    pub track: u32,
    pub encoder: String,
    pub sample_rate: String,
    pub mixdown: String,
    pub bitrate: String,
    pub name: String,
}

impl AudioStream {
    /// Passthrough of the original track
    pub fn copy(track: &AudioTrack) -> Self {
        AudioStream {
            track: track.position,
            encoder: COPY_ENCODER.to_string(),
            sample_rate: AUTO.to_string(),
            mixdown: AUTO.to_string(),
            bitrate: AUTO.to_string(),
            name: track.description.clone(),
        }
    }

    /// Stereo-compatible mixdown of the original track
    pub fn mixdown(track: &AudioTrack) -> Self {
        AudioStream {
            track: track.position,
            encoder: MIXDOWN_ENCODER.to_string(),
            sample_rate: AUTO.to_string(),
            mixdown: MIXDOWN_MODE.to_string(),
            bitrate: MIXDOWN_BITRATE.to_string(),
            name: format!("{} (mixdown)", track.description),
        }
    }
}

/// Manual encoder settings used when no named preset is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSettings {
    pub encoder: String,
    pub quality: String,
    /// x264 option string, `None` when empty
    pub x264_options: Option<String>,
    pub ipod_atom: bool,
    pub optimize: bool,
    pub markers: bool,
    pub decomb: bool,
    pub detelecine: bool,
    /// Fixed crop, `None` to let the engine crop automatically
    pub crop: Option<String>,
    pub loose_anamorphic: bool,
    pub modulus: Option<u32>,
    pub audio_streams: Vec<AudioStream>,
    pub audio_fallback: String,
    /// Subtitle track positions
    pub subtitles: Vec<u32>,
}

/// How the video and audio are tuned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tuning {
    /// Named engine preset
    Preset(String),
    /// Settings derived from the policy
    Manual(ManualSettings),
}

/// Complete description of one engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Title position on the source
    pub title: u32,
    pub container: Container,
    pub chapters: Option<String>,
    pub verbose: bool,
    pub tuning: Tuning,
    pub extra_args: Vec<String>,
}

impl EncodeJob {
    /// HandBrakeCLI arguments for this job
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut push = |flag: &str, value: Option<String>| {
            args.push(flag.to_string());
            if let Some(value) = value {
                args.push(value);
            }
        };

        push("--input", Some(self.input.to_string_lossy().to_string()));
        push("--output", Some(self.output.to_string_lossy().to_string()));
        if let Some(chapters) = &self.chapters {
            push("--chapters", Some(chapters.clone()));
        }
        if self.verbose {
            push("--verbose", None);
        }

        match &self.tuning {
            Tuning::Preset(name) => push("--preset", Some(name.clone())),
            Tuning::Manual(settings) => {
                push("--encoder", Some(settings.encoder.clone()));
                push("--quality", Some(settings.quality.clone()));
                if settings.ipod_atom {
                    push("--ipod-atom", None);
                }
                if let Some(options) = &settings.x264_options {
                    push("-x", Some(options.clone()));
                }
                push("--format", Some(self.container.format_name().to_string()));
                if settings.optimize {
                    push("--optimize", None);
                }
                if settings.markers {
                    push("--markers", None);
                }

                // picture settings
                if settings.decomb {
                    push("--decomb", None);
                }
                if settings.detelecine {
                    push("--detelecine", None);
                }
                if let Some(crop) = &settings.crop {
                    push("--crop", Some(crop.clone()));
                }
                if settings.loose_anamorphic {
                    push("--loose-anamorphic", None);
                }
                if let Some(modulus) = settings.modulus {
                    push("--modulus", Some(modulus.to_string()));
                }

                // audio, one positional entry per stream in every list
                let streams = &settings.audio_streams;
                if !streams.is_empty() {
                    push("--audio", Some(join(streams, |s| s.track.to_string())));
                    push("--aencoder", Some(join(streams, |s| s.encoder.clone())));
                    push("--arate", Some(join(streams, |s| s.sample_rate.clone())));
                    push("--mixdown", Some(join(streams, |s| s.mixdown.clone())));
                    push("--ab", Some(join(streams, |s| s.bitrate.clone())));
                    // Names must not break the comma-separated list
                    push("--aname", Some(join(streams, |s| s.name.replace(',', ";"))));
                }
                push("--audio-fallback", Some(settings.audio_fallback.clone()));

                if !settings.subtitles.is_empty() {
                    let positions: Vec<String> = settings.subtitles.iter().map(u32::to_string).collect();
                    push("--subtitle", Some(positions.join(",")));
                }
            }
        }

        push("--title", Some(self.title.to_string()));
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Single-line rendering of the invocation for logs and dry runs
    pub fn command_line(&self, binary: &str) -> String {
        std::iter::once(binary.to_string())
            .chain(self.to_args())
            .map(|arg| quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for EncodeJob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "title {:02} -> {}", self.title, self.output.display())
    }
}

/// Builds encode jobs from accepted titles
#[derive(Debug)]
pub struct JobAssembler<'a> {
    config: &'a Config,
}

impl<'a> JobAssembler<'a> {
    pub fn new(config: &'a Config) -> Self {
        JobAssembler { config }
    }

    /// Assemble the job for an accepted title
    pub fn assemble(&self, source: &Source, selection: &TitleSelection) -> Result<EncodeJob, JobError> {
        let container = Container::from_path(&selection.output_path)?;

        let tuning = match self.config.preset.as_deref().filter(|p| !p.is_empty()) {
            Some(preset) => Tuning::Preset(preset.to_string()),
            None => Tuning::Manual(self.manual_settings(container, selection)?),
        };

        Ok(EncodeJob {
            input: source.path.clone(),
            output: selection.output_path.clone(),
            title: selection.title.position,
            container,
            chapters: self.config.chapters.clone(),
            verbose: self.config.engine_verbose,
            tuning,
            extra_args: self.config.extra_args(),
        })
    }

    // @derives: Video, picture, audio and subtitle settings from the policy
    fn manual_settings(&self, container: Container, selection: &TitleSelection) -> Result<ManualSettings, JobError> {
        let config = self.config;
        let ipod = config.ipod_compatibility && container == Container::Mp4;

        let mut options: Vec<String> = Vec::new();
        if let Some(name) = &config.x264_preset {
            let tuning = x264_tuning(name)?;
            if !tuning.is_empty() {
                options.push(tuning.to_string());
            }
        }
        if ipod {
            options.push(format!(
                "level=30:bframes=0:cabac=0:weightp=0:8x8dct=0:vbv-maxrate={}:vbv-bufsize={}",
                config.ipod_max_bitrate_kbps, IPOD_VBV_BUFSIZE
            ));
        }

        let mut audio_streams = Vec::new();
        for track in selection.audio_tracks.iter().copied() {
            if config.skip_commentaries && track.is_commentary() {
                debug!("Skipping commentary audio-track: {}", track);
                continue;
            }
            if config.audio_mode.emits_copy() {
                audio_streams.push(AudioStream::copy(track));
            }
            if config.audio_mode.emits_mixdown() {
                audio_streams.push(AudioStream::mixdown(track));
            }
        }

        let subtitles = selection.subtitles.iter()
            .filter(|s| !(config.skip_commentaries && s.is_commentary()))
            .map(|s| s.position)
            .collect();

        Ok(ManualSettings {
            encoder: VIDEO_ENCODER.to_string(),
            quality: VIDEO_QUALITY.to_string(),
            x264_options: if options.is_empty() { None } else { Some(options.join(":")) },
            ipod_atom: ipod,
            optimize: container == Container::Mp4,
            markers: true,
            decomb: true,
            detelecine: true,
            crop: if config.autocrop { None } else { Some("0:0:0:0".to_string()) },
            loose_anamorphic: !config.ipod_compatibility,
            modulus: if config.ipod_compatibility { None } else { Some(MODULUS) },
            audio_streams,
            audio_fallback: MIXDOWN_ENCODER.to_string(),
            subtitles,
        })
    }
}

fn join(streams: &[AudioStream], field: impl Fn(&AudioStream) -> String) -> String {
    streams.iter().map(field).collect::<Vec<_>>().join(",")
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}
