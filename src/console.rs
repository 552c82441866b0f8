//! Line-oriented prompts and report printing.
//!
//! The prompter owns its reader and writer so sessions can be driven by
//! scripted input in tests and by stdin/stdout in the binaries.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::analysis::{parse_bound, AnalysisReport, LengthRange, RangeError};

/// Prompt/answer loop over any buffered reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Wraps an input/output pair.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Gives back the output sink (used by tests to inspect the transcript).
    pub fn into_output(self) -> W {
        self.output
    }

    /// Writes one line.
    pub fn say(&mut self, line: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", line.as_ref()).context("failed to write to console")
    }

    /// Prints `label`, reads one line and returns it without the line terminator.
    ///
    /// Closed input is an error: no later prompt could be answered either.
    pub fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}").context("failed to write prompt")?;
        self.output.flush().context("failed to flush prompt")?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read console input")?;
        if read == 0 {
            bail!("input closed");
        }
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    /// Asks for a non-blank answer, repeating the prompt until one is given.
    pub fn ask_non_empty(&mut self, label: &str) -> Result<String> {
        loop {
            let answer = self.ask(label)?;
            if !answer.trim().is_empty() {
                return Ok(answer.trim().to_string());
            }
            self.say("A value is required. Please try again.")?;
        }
    }

    /// Asks for a minimum and maximum and repeats both prompts until they form a valid range.
    pub fn ask_range(&mut self, subject: &str) -> Result<LengthRange> {
        loop {
            match self.read_range(subject)? {
                Ok(range) => return Ok(range),
                Err(err) => self.say(format!("{}. Please try again.", capitalize(&err.to_string())))?,
            }
        }
    }

    fn read_range(&mut self, subject: &str) -> Result<Result<LengthRange, RangeError>> {
        let min = self.ask(&format!("Enter the minimum {subject} length: "))?;
        let min = match parse_bound(&min) {
            Ok(min) => min,
            Err(err) => return Ok(Err(err)),
        };
        let max = self.ask(&format!("Enter the maximum {subject} length: "))?;
        let max = match parse_bound(&max) {
            Ok(max) => max,
            Err(err) => return Ok(Err(err)),
        };
        Ok(LengthRange::new(min, max))
    }

    /// Blocks until the user presses Enter.
    pub fn pause(&mut self) -> Result<()> {
        self.ask("Press Enter to return to the menu...")?;
        Ok(())
    }

    /// Prints the report rows (query row highlighted) followed by its chart.
    pub fn show_report(&mut self, report: &AnalysisReport) -> Result<()> {
        self.say(&report.heading)?;
        if report.rows.is_empty() {
            self.say("  (no matching rows)")?;
        }
        for row in &report.rows {
            let line = format_cells(&row.cells);
            if row.highlighted {
                self.say(line.yellow().to_string())?;
            } else {
                self.say(line)?;
            }
        }
        self.say("")?;
        self.say(report.chart.render())
    }
}

fn format_cells(cells: &[String]) -> String {
    format!("[{}]", cells.join(" | "))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(input: &str) -> Prompter<&[u8], Vec<u8>> {
        Prompter::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn range_prompt_repeats_until_valid() {
        let mut prompter = scripted("abc\n-1\n4\n9\n3\n5\n8\n");
        let range = prompter.ask_range("title").unwrap();
        assert_eq!((range.min(), range.max()), (5, 8));

        let transcript = String::from_utf8(prompter.into_output()).unwrap();
        assert!(transcript.contains("'abc' is not a whole number"));
        assert!(transcript.contains("Lengths cannot be negative"));
        assert!(transcript.contains("Minimum 9 is greater than maximum 3"));
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut prompter = scripted("");
        assert!(prompter.ask("anything? ").is_err());
    }

    #[test]
    fn blank_answers_are_re_asked() {
        let mut prompter = scripted("\n   \nwidgets\n");
        assert_eq!(prompter.ask_non_empty("keyword: ").unwrap(), "widgets");
    }

    #[test]
    fn strips_crlf() {
        let mut prompter = scripted("abc\r\n");
        assert_eq!(prompter.ask("> ").unwrap(), "abc");
    }
}
