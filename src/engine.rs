/*!
 * Transcoding engine abstraction.
 *
 * The controller only talks to the engine through [`TranscodeEngine`], so the
 * selection and assembly logic can be exercised without spawning processes.
 * [`HandBrakeCli`] is the implementation backed by the HandBrakeCLI binary.
 */

use std::fmt::Debug;
use std::path::Path;
use std::process::Stdio;
use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;
use crate::errors::EngineError;
use crate::job::EncodeJob;

/// Exit information of one engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutcome {
    /// Process exit code, `None` if terminated by a signal
    pub exit_code: Option<i32>,
}

/// Common trait for transcoding engines
#[async_trait]
pub trait TranscodeEngine: Send + Sync + Debug {
    /// Scan a source and return the raw diagnostic text
    async fn scan(&self, input: &Path) -> Result<String, EngineError>;

    /// Run one encode job to completion.
    ///
    /// The outcome is informational; success is judged by the output file.
    async fn run(&self, job: &EncodeJob) -> Result<EngineOutcome, EngineError>;

    /// Binary or name used when rendering command lines
    fn binary(&self) -> &str;
}

/// Engine backed by the HandBrakeCLI executable
#[derive(Debug, Clone)]
pub struct HandBrakeCli {
    binary: String,
}

impl HandBrakeCli {
    pub fn new(binary: &str) -> Self {
        HandBrakeCli {
            binary: binary.to_string(),
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> EngineError {
        EngineError::Spawn {
            binary: self.binary.clone(),
            source,
        }
    }
}

#[async_trait]
impl TranscodeEngine for HandBrakeCli {
    async fn scan(&self, input: &Path) -> Result<String, EngineError> {
        debug!("Scanning {:?} with {}", input, self.binary);

        let output = Command::new(&self.binary)
            .arg("-i")
            .arg(input)
            .args(["--scan", "-t", "0"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        // The scan report is written to stderr
        let mut text = String::from_utf8_lossy(&output.stderr).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stdout));

        if text.trim().is_empty() {
            return Err(EngineError::EmptyOutput(input.to_path_buf()));
        }

        Ok(text)
    }

    async fn run(&self, job: &EncodeJob) -> Result<EngineOutcome, EngineError> {
        info!("{}", job.command_line(&self.binary));

        let status = Command::new(&self.binary)
            .args(job.to_args())
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        debug!("{} exited with {}", self.binary, status);
        Ok(EngineOutcome {
            exit_code: status.code(),
        })
    }

    fn binary(&self) -> &str {
        &self.binary
    }
}
