//! Line-based operator prompts
//!
//! Generic over the reader and writer so the flows can be driven from a
//! `Cursor` in tests. A closed input stream is an error, never an endless
//! re-prompt.

use colored::Colorize;
use std::io::{self, BufRead, StdinLock, Write};
use substore_core::{
    generate_api_path, normalize_api_path, parse_port, validate_domain, DeployConfig,
    DEFAULT_PORT,
};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Box<dyn Write>> {
    /// Prompts on stdout, or on stderr when stdout carries a JSON document
    pub fn stdio(to_stderr: bool) -> Self {
        let output: Box<dyn Write> = if to_stderr {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        };
        Self::new(io::stdin().lock(), output)
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question`, read one line and return it trimmed
    pub fn ask(&mut self, question: &str) -> anyhow::Result<String> {
        write!(self.output, "{} ", question.bright_white().bold())?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            writeln!(self.output)?;
            anyhow::bail!("Input closed while waiting for: {}", question.trim_end_matches(':'));
        }
        Ok(answer.trim().to_string())
    }

    /// Yes/no question where anything but `y`/`yes` means no
    pub fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        let answer = self.ask(question)?;
        Ok(is_yes(&answer))
    }

    pub fn domain(&mut self) -> anyhow::Result<String> {
        loop {
            let answer = self.ask("Domain name (e.g. sub.example.com):")?;
            match validate_domain(&answer) {
                Ok(domain) => return Ok(domain),
                Err(e) => self.reject(&e.to_string())?,
            }
        }
    }

    pub fn port(&mut self) -> anyhow::Result<u16> {
        loop {
            let answer = self.ask(&format!("Local port for Sub-Store [{}]:", DEFAULT_PORT))?;
            match parse_port(&answer) {
                Ok(port) => return Ok(port),
                Err(e) => self.reject(&e.to_string())?,
            }
        }
    }

    /// Empty answer generates a fresh random path
    pub fn api_path(&mut self) -> anyhow::Result<String> {
        loop {
            let answer = self.ask("Backend API path [random]:")?;
            if answer.is_empty() {
                return Ok(generate_api_path());
            }
            match normalize_api_path(&answer) {
                Ok(path) => return Ok(path),
                Err(e) => self.reject(&e.to_string())?,
            }
        }
    }

    /// Optional registration email; empty means none
    pub fn email(&mut self) -> anyhow::Result<Option<String>> {
        let answer = self.ask("Email for Let's Encrypt notices (empty to skip):")?;
        Ok(Some(answer).filter(|a| !a.is_empty()))
    }

    pub fn section(&mut self, title: &str) -> anyhow::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", format!("── {} ──", title).bright_yellow().bold())?;
        writeln!(self.output)?;
        Ok(())
    }

    /// Echo the assembled configuration ahead of the confirmation
    pub fn review(&mut self, config: &DeployConfig) -> anyhow::Result<()> {
        self.section("Review")?;
        self.info("Domain", &config.domain)?;
        self.info("Port", &config.port.to_string())?;
        self.info("API path", &config.api_path)?;
        self.info("API URL", &config.api_url())?;
        if let Some(email) = &config.email {
            self.info("Email", email)?;
        }
        writeln!(self.output)?;
        Ok(())
    }

    fn info(&mut self, label: &str, value: &str) -> anyhow::Result<()> {
        writeln!(
            self.output,
            "   {} {}",
            format!("{}:", label).bright_white().bold(),
            value.bright_cyan()
        )?;
        Ok(())
    }

    fn reject(&mut self, reason: &str) -> anyhow::Result<()> {
        writeln!(self.output, "   {} {}", "✗".bright_red(), reason.bright_red())?;
        Ok(())
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
impl<R> Prompter<R, Vec<u8>> {
    /// Everything written so far
    pub fn transcript(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }
}
