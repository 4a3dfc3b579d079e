//! Line-based prompts on the controlling terminal.

use anyhow::{Result, bail};
use std::io::IsTerminal;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// Reads answers from stdin; questions go to stderr so stdout stays clean
/// for command output.
pub struct Prompter {
    lines: Lines<BufReader<Stdin>>,
    interactive: bool,
}

impl Prompter {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            interactive: std::io::stdin().is_terminal(),
        }
    }

    /// Whether a person is there to answer.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub async fn ask(&mut self, label: &str) -> Result<String> {
        let mut stderr = tokio::io::stderr();
        stderr.write_all(format!("{label}: ").as_bytes()).await?;
        stderr.flush().await?;

        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
            None => bail!("input closed while waiting for {label}"),
        }
    }

    /// Asks until the answer is not blank.
    pub async fn ask_required(&mut self, label: &str) -> Result<String> {
        loop {
            let answer = self.ask(label).await?;
            if !answer.trim().is_empty() {
                return Ok(answer);
            }
        }
    }
}
