//! Bounded subprocess execution for the document converters.
//!
//! A converter run is a single shot: spawn the binary, capture stdout,
//! give up after the timeout. A non-zero exit, a missing binary and a
//! timeout all surface as `ConversionFailed` for the document kind
//! being converted.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

use crate::upload::UploadError;

pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run a converter and return its stdout.
    pub async fn run(
        &self,
        kind: &'static str,
        program: &str,
        args: &[&str],
    ) -> Result<Vec<u8>, UploadError> {
        let failed = |reason: String| UploadError::ConversionFailed { kind, reason };

        debug!(program = %program, args = ?args, "Running converter");

        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();
        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                failed(format!(
                    "{program} timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| failed(format!("Failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(program = %program, stderr = %stderr, "Converter failed");
            return Err(failed(format!("{program} failed: {stderr}")));
        }

        debug!(program = %program, output_size = output.stdout.len(), "Converter finished");
        Ok(output.stdout)
    }
}
