//! Terminal output helpers and the interactive console

use crate::prompt::Prompter;
use colored::Colorize;
use std::io::{BufRead, Write};
use substore_provisioner::{CertificateRequest, Console, ProvisionError};

/// Output format for the install command
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors and formatting
    #[default]
    Text,
    /// JSON output for automation and scripting
    Json,
}

pub fn print_header() {
    println!();
    println!(
        "{}",
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan()
    );
    println!(
        "{}",
        "           🚀 Sub-Store Deployment".bright_white().bold()
    );
    println!(
        "{}",
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan()
    );
    println!();
}

pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("── {} ──", title).bright_yellow().bold());
    println!();
}

pub fn print_success(message: &str) {
    println!("{} {}", "✅".bright_green(), message.bright_white());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠️ ".bright_yellow(), message.bright_yellow());
}

pub fn print_info(label: &str, value: &str) {
    println!(
        "   {} {}",
        format!("{}:", label).bright_white().bold(),
        value.bright_cyan()
    );
}

pub fn print_step(step: usize, total: usize, description: &str) {
    println!(
        "   {} {}",
        format!("[{}/{}]", step, total).bright_cyan().bold(),
        description.bright_white()
    );
}

pub fn print_substep(description: &str) {
    println!("       {} {}", "→".bright_cyan(), description);
}

/// How the mid-run certificate question gets answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificatePolicy {
    /// Ask on the terminal
    Ask,
    /// Answer yes without asking
    Issue { email: Option<String> },
    /// Answer no without asking
    Skip,
}

/// [`Console`] that prints progress and asks through a [`Prompter`].
///
/// With `quiet` set (JSON output) progress is not printed; warnings go to
/// stderr so stdout stays machine-readable.
pub struct TerminalConsole<R, W> {
    prompter: Prompter<R, W>,
    certificate: CertificatePolicy,
    quiet: bool,
    warnings: Vec<String>,
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(prompter: Prompter<R, W>, certificate: CertificatePolicy, quiet: bool) -> Self {
        Self {
            prompter,
            certificate,
            quiet,
            warnings: Vec::new(),
        }
    }

    /// Warnings emitted so far
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn ask_certificate(&mut self, domain: &str) -> anyhow::Result<Option<CertificateRequest>> {
        let question = format!("Issue a Let's Encrypt certificate for {}? [y/N]:", domain);
        if !self.prompter.confirm(&question)? {
            return Ok(None);
        }
        let email = self.prompter.email()?;
        Ok(Some(CertificateRequest { email }))
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn step(&mut self, index: usize, total: usize, title: &str) {
        if !self.quiet {
            println!();
            print_step(index, total, title);
        }
    }

    fn detail(&mut self, message: &str) {
        if !self.quiet {
            print_substep(message);
        }
    }

    fn success(&mut self, message: &str) {
        if !self.quiet {
            print!("       ");
            print_success(message);
        }
    }

    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
        if self.quiet {
            eprintln!("warning: {}", message);
        } else {
            print!("       ");
            print_warning(message);
        }
    }

    fn request_certificate(
        &mut self,
        domain: &str,
    ) -> Result<Option<CertificateRequest>, ProvisionError> {
        match self.certificate.clone() {
            CertificatePolicy::Skip => Ok(None),
            CertificatePolicy::Issue { email } => Ok(Some(CertificateRequest { email })),
            CertificatePolicy::Ask => self
                .ask_certificate(domain)
                .map_err(|e| ProvisionError::Interaction(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str, policy: CertificatePolicy) -> TerminalConsole<Cursor<Vec<u8>>, Vec<u8>> {
        let prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        TerminalConsole::new(prompter, policy, true)
    }

    #[test]
    fn test_certificate_question_defaults_to_no() {
        let mut console = console("\n", CertificatePolicy::Ask);
        assert_eq!(console.request_certificate("example.com").unwrap(), None);
    }

    #[test]
    fn test_certificate_question_reads_email() {
        let mut console = console("y\nops@example.com\n", CertificatePolicy::Ask);
        assert_eq!(
            console.request_certificate("example.com").unwrap(),
            Some(CertificateRequest {
                email: Some("ops@example.com".to_string())
            })
        );

        let mut console = self::console("yes\n\n", CertificatePolicy::Ask);
        assert_eq!(
            console.request_certificate("example.com").unwrap(),
            Some(CertificateRequest { email: None })
        );
    }

    #[test]
    fn test_closed_input_is_an_interaction_error() {
        let mut console = console("", CertificatePolicy::Ask);
        let err = console.request_certificate("example.com").unwrap_err();
        assert!(matches!(err, ProvisionError::Interaction(_)));
    }

    #[test]
    fn test_preset_answers_do_not_read_input() {
        let mut console = console("", CertificatePolicy::Skip);
        assert_eq!(console.request_certificate("example.com").unwrap(), None);

        let mut console = self::console(
            "",
            CertificatePolicy::Issue {
                email: Some("ops@example.com".to_string()),
            },
        );
        assert!(console.request_certificate("example.com").unwrap().is_some());
    }

    #[test]
    fn test_warnings_are_collected() {
        let mut console = console("", CertificatePolicy::Skip);
        console.warning("certbot failed");
        assert_eq!(console.warnings(), ["certbot failed".to_string()]);
    }
}
