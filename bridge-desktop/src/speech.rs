//! Local Speech Synthesis via an External TTS Program
//!
//! Shells out to a command-line synthesizer (espeak-ng by default) and
//! captures the generated audio from stdout. This is strictly the degraded
//! fallback path; quality is not expected to match the server-side TTS.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    speech::SpeechSynthesizer,
};
use bytes::Bytes;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Synthesizer backed by an external command.
///
/// The command is invoked as `<program> -v <lang> --stdout <text>` and must
/// write encoded audio to stdout, which matches espeak/espeak-ng.
pub struct CommandSynthesizer {
    program: String,
}

impl CommandSynthesizer {
    /// Use the default program (`espeak-ng`).
    pub fn new() -> Self {
        Self::with_program("espeak-ng")
    }

    /// Use a custom synthesis program.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Bytes> {
        debug!(program = %self.program, lang, "Invoking local synthesizer");

        let output = Command::new(&self.program)
            .arg("-v")
            .arg(lang)
            .arg("--stdout")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BridgeError::NotAvailable(format!(
                        "synthesizer program '{}' not installed",
                        self.program
                    ))
                } else {
                    BridgeError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(program = %self.program, status = ?output.status.code(), "Synthesis failed");
            return Err(BridgeError::OperationFailed(format!(
                "synthesizer exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(BridgeError::OperationFailed(
                "synthesizer produced no audio".to_string(),
            ));
        }

        Ok(Bytes::from(output.stdout))
    }

    fn is_available(&self) -> bool {
        which_in_path(&self.program)
    }
}

/// Look the program up on PATH without spawning it.
fn which_in_path(program: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
}
