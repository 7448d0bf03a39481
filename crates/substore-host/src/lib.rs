//! Host command execution for substore-deploy
//!
//! Every external tool the provisioner drives (apt-get, systemctl, ufw,
//! nginx, certbot, docker) goes through the [`CommandRunner`] trait so the
//! sequence can run against the real host, a dry-run logger, or a recording
//! fake in tests.

pub mod command;
pub mod dry_run;
pub mod error;
pub mod privilege;
pub mod system;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use command::{shell_quote, CommandOutput, CommandRunner, CommandSpec};
pub use dry_run::DryRunCommandRunner;
pub use error::HostError;
pub use privilege::running_as_root;
pub use system::SystemCommandRunner;
