//! Command description, captured output, and the runner trait

use crate::error::HostError;
use crate::privilege::running_as_root;
use async_trait::async_trait;
use std::fmt;

/// One external program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-style rendering, quoting arguments that need it
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// Quote a word for display (and for embedding in generated shell scripts)
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '@' | ',' | '+' | '%')
        });
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// stderr if it says anything, stdout otherwise
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if stdout.is_empty() {
            "no output".to_string()
        } else {
            stdout.to_string()
        }
    }
}

/// Trait for running external programs on the host
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output.
    ///
    /// A non-zero exit is not an error here; callers decide what a failure
    /// means for their step.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, HostError>;

    /// Whether the process holds superuser privilege
    fn is_privileged(&self) -> bool {
        running_as_root()
    }

    /// True when commands are only logged, never executed
    fn is_simulated(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_rendering() {
        let spec = CommandSpec::new("certbot")
            .args(["certonly", "--nginx", "-d", "example.com"])
            .arg("--deploy-hook")
            .arg("systemctl reload nginx");
        assert_eq!(
            spec.to_string(),
            "certbot certonly --nginx -d example.com --deploy-hook 'systemctl reload nginx'"
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "plain");
        assert_eq!(shell_quote("3001:3001"), "3001:3001");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("55 23 * * *"), "'55 23 * * *'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let output = CommandOutput {
            code: Some(1),
            stdout: "some stdout".to_string(),
            stderr: "  nginx: [emerg] unexpected \"}\"\n".to_string(),
        };
        assert_eq!(output.diagnostic(), "nginx: [emerg] unexpected \"}\"");

        let output = CommandOutput {
            code: Some(1),
            stdout: "only stdout\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.diagnostic(), "only stdout");
        assert_eq!(CommandOutput::failure(1, "").diagnostic(), "no output");
    }

    #[test]
    fn test_success_helpers() {
        assert!(CommandOutput::success().is_success());
        assert!(CommandOutput::with_stdout("x").is_success());
        assert!(!CommandOutput::failure(2, "boom").is_success());
        assert!(!CommandOutput::default().is_success());
    }
}
