//! Recording runner for tests
//!
//! Every command is recorded; replies are scripted by command-line prefix.
//! Commands with no matching reply succeed with empty output.

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::HostError;
use async_trait::async_trait;
use std::sync::Mutex;

enum Reply {
    Always(CommandOutput),
    Once(Option<CommandOutput>),
}

struct Rule {
    prefix: String,
    reply: Reply,
}

pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    rules: Mutex<Vec<Rule>>,
    privileged: bool,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            rules: Mutex::new(Vec::new()),
            privileged: true,
        }
    }
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unprivileged() -> Self {
        Self {
            privileged: false,
            ..Self::default()
        }
    }

    /// Reply with `output` to every command line starting with `prefix`
    pub fn respond(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.to_string(),
            reply: Reply::Always(output),
        });
        self
    }

    /// Reply with `output` to the next command line starting with `prefix`
    pub fn respond_once(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.rules.lock().unwrap().push(Rule {
            prefix: prefix.to_string(),
            reply: Reply::Once(Some(output)),
        });
        self
    }

    /// Recorded command lines, in order
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(CommandSpec::command_line)
            .collect()
    }

    /// Index of the first recorded command starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.starts_with(prefix))
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn reply_for(&self, line: &str) -> CommandOutput {
        let mut rules = self.rules.lock().unwrap();
        // one-shot replies take precedence, oldest first
        for rule in rules.iter_mut() {
            if let Reply::Once(slot) = &mut rule.reply {
                if slot.is_some() && line.starts_with(&rule.prefix) {
                    return slot.take().unwrap_or_default();
                }
            }
        }
        // the most recent standing reply wins
        for rule in rules.iter().rev() {
            if let Reply::Always(output) = &rule.reply {
                if line.starts_with(&rule.prefix) {
                    return output.clone();
                }
            }
        }
        CommandOutput::success()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, HostError> {
        self.calls.lock().unwrap().push(spec.clone());
        Ok(self.reply_for(&spec.command_line()))
    }

    fn is_privileged(&self) -> bool {
        self.privileged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies() {
        let runner = RecordingRunner::new();
        runner
            .respond("docker ps", CommandOutput::with_stdout("sub-store\n"))
            .respond_once("docker ps", CommandOutput::with_stdout(""));

        let ps = CommandSpec::new("docker").arg("ps");
        assert_eq!(runner.run(&ps).await.unwrap().stdout, "");
        assert_eq!(runner.run(&ps).await.unwrap().stdout, "sub-store\n");
        assert!(runner
            .run(&CommandSpec::new("nginx").arg("-t"))
            .await
            .unwrap()
            .is_success());

        assert_eq!(runner.commands(), vec!["docker ps", "docker ps", "nginx -t"]);
        assert_eq!(runner.count("docker ps"), 2);
        assert_eq!(runner.position("nginx"), Some(2));
    }
}
