//! Command backend: delegate generation to an external program.
//!
//! The rendered prompt is written to the program's stdin and its stdout is
//! taken as the raw completion. Useful for local runners such as
//! `llama-cli` or for wrapping any other model behind a script.

use std::{
    io::{self, Write},
    process::{Command, Stdio},
    thread,
};

use tracing::debug;

use crate::config::CommandConfig;

use super::{Inference, InferenceError, extract_response, render_prompt};

/// Inference through a child process.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(config: &CommandConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

impl Inference for CommandBackend {
    fn generate(&self, instruction: &str, context: &str) -> Result<String, InferenceError> {
        let prompt = render_prompt(instruction, context);
        debug!(
            program = %self.program,
            prompt_len = prompt.len(),
            "requesting completion from command"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| InferenceError::Unavailable(format!("failed to run {}: {e}", self.program)))?;

        // The prompt is fed from a separate thread while this one drains
        // stdout and stderr; a child that echoes its input would otherwise
        // block on a full pipe while we block writing the rest of the prompt.
        let stdin = child.stdin.take();
        let writer = thread::spawn(move || -> io::Result<()> {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            // A program that exits without reading its input closes the pipe
            // early; its exit status decides the outcome.
            match stdin.write_all(prompt.as_bytes()) {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                result => result,
            }
        });

        let output = child
            .wait_with_output()
            .map_err(|e| InferenceError::Unavailable(format!("failed to wait for {}: {e}", self.program)))?;

        writer
            .join()
            .map_err(|_| {
                InferenceError::Unavailable(format!("prompt writer for {} panicked", self.program))
            })?
            .map_err(|e| {
                InferenceError::Unavailable(format!(
                    "failed to write prompt to {}: {e}",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InferenceError::Backend(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| InferenceError::Malformed(format!("output is not UTF-8: {e}")))?;
        extract_response(&stdout)
    }
}
