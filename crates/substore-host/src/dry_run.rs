//! Runner that logs commands instead of executing them

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::HostError;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Default)]
pub struct DryRunCommandRunner {
    planned: Mutex<Vec<String>>,
}

impl DryRunCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command lines seen so far, in order
    pub fn planned(&self) -> Vec<String> {
        self.planned
            .lock()
            .map(|planned| planned.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for DryRunCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, HostError> {
        let line = spec.command_line();
        info!("[dry-run] {}", line);
        if let Ok(mut planned) = self.planned.lock() {
            planned.push(line);
        }
        Ok(CommandOutput::success())
    }

    fn is_privileged(&self) -> bool {
        true
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
