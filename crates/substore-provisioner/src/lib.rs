//! Sub-Store host provisioning
//!
//! Walks a fixed, forward-only sequence of steps:
//! - privilege check
//! - package install, service enable, firewall rules
//! - nginx site (HTTP, then HTTPS once a certificate is issued)
//! - container launch with a bounded liveness poll
//! - renewal and update jobs, management script
//!
//! Nothing is retried (apart from the liveness poll) and nothing is rolled
//! back. Which failures abort the run is decided here, per step.

pub mod console;
pub mod container;
pub mod error;
mod files;
pub mod jobs;
pub mod manage;
pub mod options;
pub mod provisioner;
pub mod summary;

pub use console::{CertificateRequest, Console};
pub use container::ContainerLauncher;
pub use error::ProvisionError;
pub use options::{FirewallOrder, HealthCheckPolicy, ProvisionOptions, Strictness};
pub use provisioner::{CertificateOutcome, ProvisionReport, Provisioner, STEP_TITLES};
pub use summary::Summary;
