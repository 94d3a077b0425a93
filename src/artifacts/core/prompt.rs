//! Decision points
//!
//! Every question the tool asks goes through a `Prompter`, so the CLI can read
//! from the terminal while tests and library callers script the answers.

use std::collections::VecDeque;
use std::io::{BufRead, Read, Write};

/// End-of-text marker for multi-line input (Ctrl-X)
pub const END_OF_TEXT: u8 = 0x18;

pub trait Prompter {
    /// Ask a yes/no question; no answer means `default`
    fn confirm(&mut self, question: &str, default: bool) -> anyhow::Result<bool>;

    /// Read a single line
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<String>;

    /// Read free text up to Ctrl-X or end of input
    fn read_text(&mut self, prompt: &str) -> anyhow::Result<String>;
}

/// Prompts on stderr and reads answers from stdin
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl StdinPrompter {
    fn ask(prompt: &str) -> anyhow::Result<()> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{prompt}")?;
        stderr.flush()?;

        Ok(())
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> anyhow::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        Self::ask(&format!("{question} {hint} "))?;

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer)? == 0 {
            return Ok(default);
        }

        Ok(parse_answer(&answer).unwrap_or(default))
    }

    fn read_line(&mut self, prompt: &str) -> anyhow::Result<String> {
        Self::ask(prompt)?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_text(&mut self, prompt: &str) -> anyhow::Result<String> {
        Self::ask(prompt)?;

        let mut text = Vec::new();
        for byte in std::io::stdin().lock().bytes() {
            let byte = byte?;
            if byte == END_OF_TEXT {
                break;
            }
            text.push(byte);
        }

        Ok(String::from_utf8_lossy(&text).trim_end().to_string())
    }
}

fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Replays canned answers; once they run out, every question gets its default
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompter {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Every prompt shown so far, in order
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> anyhow::Result<bool> {
        self.asked.push(question.to_string());

        Ok(self
            .answers
            .pop_front()
            .and_then(|answer| parse_answer(&answer))
            .unwrap_or(default))
    }

    fn read_line(&mut self, prompt: &str) -> anyhow::Result<String> {
        self.asked.push(prompt.to_string());

        Ok(self.answers.pop_front().unwrap_or_default())
    }

    fn read_text(&mut self, prompt: &str) -> anyhow::Result<String> {
        self.read_line(prompt)
    }
}
