//! Outcome collaborators: whoever observed what happened when a plan ran.
//!
//! The mission loop blocks on [`OutcomeProvider::obtain_outcome`] between
//! generating a plan and reflecting on it. A human at a terminal answers
//! through [`Console`]; scripted runs and automated checkers use [`Fixed`]
//! or their own implementation.

use std::io::{self, BufRead, Write};

/// Errors from an outcome collaborator.
#[derive(Debug, thiserror::Error)]
pub enum OutcomeError {
    #[error("failed to read outcome: {0}")]
    Io(#[from] io::Error),

    #[error("input closed before an outcome was reported")]
    Closed,
}

/// Supplies the outcome of an attempted action plan as free text.
pub trait OutcomeProvider {
    fn obtain_outcome(&mut self, action_plan: &str) -> Result<String, OutcomeError>;
}

/// A pre-determined outcome, returned for every plan.
#[derive(Debug, Clone)]
pub struct Fixed(pub String);

impl OutcomeProvider for Fixed {
    fn obtain_outcome(&mut self, _action_plan: &str) -> Result<String, OutcomeError> {
        Ok(self.0.clone())
    }
}

const OUTCOME_QUESTION: &str = "[?] SIMULATION: Did this action work? (y/n/partial): ";

/// Line-oriented terminal interaction.
///
/// Shows the plan, asks whether it worked, and re-asks on blank answers.
/// Also serves the shell's objective prompt so that a single reader owns
/// the input stream.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and reads one line, without its line ending.
    ///
    /// Returns `None` once input is exhausted.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Writes free text followed by a newline.
    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }
}

impl<R: BufRead, W: Write> OutcomeProvider for Console<R, W> {
    fn obtain_outcome(&mut self, action_plan: &str) -> Result<String, OutcomeError> {
        self.say(&format!("\n>>> [GENERATOR ACTION]:\n{action_plan}\n"))?;
        loop {
            match self.ask(OUTCOME_QUESTION)? {
                None => return Err(OutcomeError::Closed),
                Some(answer) if answer.trim().is_empty() => {}
                Some(answer) => return Ok(answer),
            }
        }
    }
}
