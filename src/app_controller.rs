use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use std::path::PathBuf;
use chrono::Local;
use crate::app_config::Config;
use crate::engine::{HandBrakeCli, TranscodeEngine};
use crate::errors::{EncodeError, ScanError};
use crate::file_utils::{FileManager, MIN_OUTPUT_SIZE_BYTES, TIMESTAMP_FORMAT};
use crate::job::{EncodeJob, JobAssembler};
use crate::language_utils;
use crate::media::Source;
use crate::scan_parser::ScanParser;
use crate::selection::{DuplicateTracker, SkipReason, TitleDecision, TitleSelector};

// @module: Application controller for ripping a source

/// Outcome of one run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Outputs written by the engine
    pub encoded: Vec<PathBuf>,
    /// Titles rejected by a selection gate
    pub skipped: Vec<(u32, SkipReason)>,
    /// Titles whose encode did not produce a usable output
    pub failed: Vec<(u32, String)>,
    /// Jobs assembled but not run (dry run)
    pub planned: Vec<EncodeJob>,
}

/// Main application controller
#[derive(Debug)]
pub struct Controller {
    // @field: Encoding policy
    config: Config,

    // @field: Engine used for scans and encodes
    engine: Box<dyn TranscodeEngine>,
}

impl Controller {
    // @method: Create a controller that drives HandBrakeCLI
    pub fn with_config(config: Config) -> Self {
        let engine = HandBrakeCli::new(&config.handbrake_cli);
        Self::new(config, Box::new(engine))
    }

    // @method: Create a controller with an injected engine
    pub fn new(config: Config, engine: Box<dyn TranscodeEngine>) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan the input and either print its summary or rip the selected titles
    pub async fn run(&self) -> Result<RunSummary> {
        let input = self.config.input.clone()
            .ok_or_else(|| anyhow!("input not set"))?;

        info!("Scanning {:?}", input);
        let scan_output = self.engine.scan(&input)
            .await
            .map_err(ScanError::from)
            .with_context(|| format!("Failed to scan {:?}", input))?;

        let source = match ScanParser::new().parse(&scan_output, &input) {
            Ok(source) => source,
            Err(e @ ScanError::MalformedScanOutput { .. }) => {
                warn!("{}", e);
                return Ok(RunSummary::default());
            }
            Err(e) => return Err(e.into()),
        };

        if self.config.inspect_only {
            println!("{}", source.info());
            return Ok(RunSummary::default());
        }

        self.rip(&source).await
    }

    /// Rip every title of a parsed source that passes the selection gates
    pub async fn rip(&self, source: &Source) -> Result<RunSummary> {
        let config = &self.config;
        self.log_languages();

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let selector = TitleSelector::new(config);
        let assembler = JobAssembler::new(config);
        let mut tracker = DuplicateTracker::new();
        let mut summary = RunSummary::default();

        for title in &source.titles {
            debug!("checking {}", title);

            let selection = match selector.evaluate(source, title, &tracker, &timestamp) {
                TitleDecision::Accepted(selection) => selection,
                TitleDecision::Skipped(reason) => {
                    if matches!(reason, SkipReason::OutputExists(_)) {
                        warn!("skipping title {:02} because {}", title.position, reason);
                    } else {
                        info!("skipping title {:02} because {}", title.position, reason);
                    }
                    summary.skipped.push((title.position, reason));
                    continue;
                }
            };

            let job = assembler.assemble(source, &selection)
                .with_context(|| format!("Failed to assemble job for title {}", title.position))?;

            // Recorded before the encode so later duplicates are caught
            tracker.record(title.blocks);
            info!("converting {}", title);

            if config.dry_run {
                info!("{}", job.command_line(self.engine.binary()));
                summary.planned.push(job);
                continue;
            }

            match self.encode(&job).await {
                Ok(Some(_)) => {
                    info!("file {:?} created", job.output);
                    summary.encoded.push(job.output.clone());
                }
                Ok(None) => {
                    warn!("file {:?} not created", job.output);
                    summary.failed.push((title.position, "output not created".to_string()));
                }
                Err(e @ EncodeError::UndersizedOutput { .. }) => {
                    warn!("{}", e);
                    tracker.forget(title.blocks);
                    summary.failed.push((title.position, e.to_string()));
                }
                Err(e) => {
                    error!("Encoding title {} failed: {}", title.position, e);
                    summary.failed.push((title.position, e.to_string()));
                }
            }
        }

        info!(
            "Finished: {} encoded, {} planned, {} skipped, {} failed",
            summary.encoded.len(),
            summary.planned.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    // @runs: One job and checks the output it left behind
    async fn encode(&self, job: &EncodeJob) -> Result<Option<u64>, EncodeError> {
        if let Err(e) = FileManager::ensure_parent_dir(&job.output) {
            return Err(EncodeError::Io(std::io::Error::other(format!("{:#}", e))));
        }

        let outcome = self.engine.run(job).await?;
        if outcome.exit_code != Some(0) {
            // Only the output file decides success
            debug!("engine exit code {:?} for {}", outcome.exit_code, job);
        }

        FileManager::verify_output(&job.output, MIN_OUTPUT_SIZE_BYTES)
    }

    fn log_languages(&self) {
        let describe = |codes: &Option<Vec<String>>| match codes {
            None => "all".to_string(),
            Some(codes) => codes.iter()
                .map(|code| language_utils::get_language_name(code).unwrap_or_else(|_| code.clone()))
                .collect::<Vec<_>>()
                .join(", "),
        };

        debug!(
            "audio languages: {}; subtitle languages: {}",
            describe(&self.config.audio_languages),
            describe(&self.config.subtitle_languages)
        );
    }
}
