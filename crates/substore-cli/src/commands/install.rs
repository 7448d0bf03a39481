//! Install command: collect the configuration and provision the host
//!
//! Interactive by default. Flags (or their `SUBSTORE_*` env vars) answer
//! the matching prompts up front; `--non-interactive` never reads stdin.

use crate::prompt::Prompter;
use crate::ui::{
    print_header, print_info, print_section, print_success, print_warning, CertificatePolicy,
    OutputFormat, TerminalConsole,
};
use anyhow::Context;
use clap::Args;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use substore_core::{
    generate_api_path, normalize_api_path, parse_port, validate_domain, DeployConfig, HostLayout,
    DEFAULT_PORT,
};
use substore_host::{CommandRunner, DryRunCommandRunner, SystemCommandRunner};
use substore_provisioner::{
    CertificateOutcome, FirewallOrder, HealthCheckPolicy, ProvisionError, ProvisionOptions,
    ProvisionReport, Provisioner, Strictness,
};
use tracing::{debug, info};

#[derive(Args)]
pub struct InstallCommand {
    /// Domain name pointing at this host
    #[arg(long, env = "SUBSTORE_DOMAIN")]
    pub domain: Option<String>,

    /// Local port the container is published on (default 3001)
    #[arg(long, env = "SUBSTORE_PORT")]
    pub port: Option<String>,

    /// Backend API path; generated when omitted
    #[arg(long, env = "SUBSTORE_API_PATH")]
    pub api_path: Option<String>,

    /// Email for Let's Encrypt registration
    #[arg(long, env = "SUBSTORE_EMAIL")]
    pub email: Option<String>,

    /// Never prompt; requires --domain and --yes
    #[arg(long, default_value = "false")]
    pub non_interactive: bool,

    /// Skip the configuration confirmation
    #[arg(long, short = 'y', default_value = "false")]
    pub yes: bool,

    /// Request a certificate without asking
    #[arg(long, default_value = "false")]
    pub issue_certificate: bool,

    /// Abort when package, service or firewall commands fail
    #[arg(long, default_value = "false")]
    pub strict: bool,

    /// Add the ufw allow rules before enabling the firewall
    #[arg(long, default_value = "false")]
    pub allow_ssh_first: bool,

    /// Log commands instead of running them and write files under --root
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// Scratch root for --dry-run (default: a new temporary directory)
    #[arg(long, requires = "dry_run")]
    pub root: Option<PathBuf>,

    /// Number of container liveness checks before giving up
    #[arg(long, default_value = "6")]
    pub health_checks: u32,

    /// Seconds a single host command may run before it is killed
    #[arg(long, env = "SUBSTORE_COMMAND_TIMEOUT", default_value = "1800")]
    pub command_timeout: u64,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

/// JSON output structure for automation
#[derive(serde::Serialize)]
struct InstallResult {
    success: bool,
    dry_run: bool,
    certificate: String,
    container_id: String,
    renewal_job_installed: bool,
    summary: substore_provisioner::Summary,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    planned_commands: Option<Vec<String>>,
}

impl InstallCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let json = matches!(self.output_format, OutputFormat::Json);
        if !json {
            print_header();
        }

        let mut prompter = Prompter::stdio(json);
        let Some(config) = self.resolve_config(&mut prompter)? else {
            if !json {
                print_warning("Cancelled, nothing was changed");
            }
            info!("Installation cancelled by operator");
            return Ok(());
        };

        let (runner, dry_run, layout) = if self.dry_run {
            let root = self.scratch_root()?;
            if !json {
                print_info("Dry run root", &root.display().to_string());
            }
            let dry_run = Arc::new(DryRunCommandRunner::new());
            let runner: Arc<dyn CommandRunner> = dry_run.clone();
            (runner, Some(dry_run), HostLayout::rooted_at(&root))
        } else {
            let runner: Arc<dyn CommandRunner> = Arc::new(
                SystemCommandRunner::new()
                    .with_timeout(Duration::from_secs(self.command_timeout.max(1))),
            );
            (runner, None, HostLayout::default())
        };
        let config = config.with_data_dir(layout.data_dir.clone());

        let options = ProvisionOptions {
            strictness: if self.strict {
                Strictness::Strict
            } else {
                Strictness::BestEffort
            },
            firewall_order: if self.allow_ssh_first {
                FirewallOrder::AllowSshFirst
            } else {
                FirewallOrder::EnableFirst
            },
            health_check: HealthCheckPolicy {
                attempts: self.health_checks.max(1),
                ..Default::default()
            },
        };
        debug!("Provisioning options: {:?}", options);

        let provisioner = Provisioner::new(runner, layout, options);
        let mut console = TerminalConsole::new(prompter, self.certificate_policy(), json);

        let rt = tokio::runtime::Runtime::new()?;
        let report = match rt.block_on(provisioner.run(&config, &mut console)) {
            Ok(report) => report,
            Err(e) => {
                if let Some(logs) = container_logs(&e) {
                    if json {
                        eprintln!("{}", logs);
                    } else {
                        print_section("Container Logs");
                        println!("{}", logs.trim_end());
                        println!();
                    }
                }
                return Err(e).context("Provisioning failed");
            }
        };

        let planned = dry_run.map(|runner| runner.planned());
        if json {
            let result = InstallResult {
                success: true,
                dry_run: self.dry_run,
                certificate: describe_certificate(&report.certificate),
                container_id: report.container_id.clone(),
                renewal_job_installed: report.renewal_job_installed,
                summary: report.summary.clone(),
                warnings: console.warnings().to_vec(),
                planned_commands: planned,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        if let Some(planned) = planned {
            print_section("Planned Commands");
            for command in planned {
                println!("   {} {}", "$".bright_cyan(), command);
            }
        }
        print_summary(&report, console.warnings().len());
        Ok(())
    }

    /// Assemble the configuration from flags and prompts.
    ///
    /// Returns `Ok(None)` when the operator declines the confirmation.
    fn resolve_config<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
    ) -> anyhow::Result<Option<DeployConfig>> {
        let interactive = !self.non_interactive;
        if !interactive && !self.yes {
            anyhow::bail!("--non-interactive requires --yes to confirm the configuration");
        }
        if interactive {
            prompter.section("Configuration")?;
        }

        let domain = match &self.domain {
            Some(domain) => validate_domain(domain)?,
            None if interactive => prompter.domain()?,
            None => anyhow::bail!("--domain is required with --non-interactive"),
        };
        let port = match &self.port {
            Some(port) => parse_port(port)?,
            None if interactive => prompter.port()?,
            None => DEFAULT_PORT,
        };
        let api_path = match &self.api_path {
            Some(path) => normalize_api_path(path)?,
            None if interactive => prompter.api_path()?,
            None => generate_api_path(),
        };
        let config = DeployConfig::new(&domain, port, &api_path)?.with_email(self.email.clone());

        prompter.review(&config)?;

        if self.yes || prompter.confirm("Proceed with this configuration? [y/N]:")? {
            Ok(Some(config))
        } else {
            Ok(None)
        }
    }

    fn certificate_policy(&self) -> CertificatePolicy {
        if self.issue_certificate {
            CertificatePolicy::Issue {
                email: self.email.clone(),
            }
        } else if self.non_interactive {
            CertificatePolicy::Skip
        } else {
            CertificatePolicy::Ask
        }
    }

    fn scratch_root(&self) -> anyhow::Result<PathBuf> {
        match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("Failed to create {}", root.display()))?;
                Ok(root.clone())
            }
            // kept after the run so the rendered files can be inspected
            None => Ok(tempfile::Builder::new()
                .prefix("substore-dry-run-")
                .tempdir()?
                .keep()),
        }
    }
}

fn describe_certificate(outcome: &CertificateOutcome) -> String {
    match outcome {
        CertificateOutcome::Issued => "issued".to_string(),
        CertificateOutcome::IssuedHttpOnly(reason) => format!("issued, https not enabled: {}", reason),
        CertificateOutcome::Skipped => "skipped".to_string(),
        CertificateOutcome::Failed(reason) => format!("failed: {}", reason),
        CertificateOutcome::Simulated => "not requested (dry run)".to_string(),
    }
}

/// Container output worth showing next to the error; main prints the error itself
fn container_logs(error: &ProvisionError) -> Option<&str> {
    match error {
        ProvisionError::ContainerNotRunning { logs, .. } => Some(logs.as_str()),
        _ => None,
    }
}

fn print_summary(report: &ProvisionReport, warnings: usize) {
    let summary = &report.summary;
    print_section("Deployment Complete!");

    print_info("Site", &summary.site_url);
    print_info("API", &summary.api_url);
    print_info("Health", &summary.health_url);
    print_info("Data directory", &summary.data_dir);
    print_info("Certificate", &describe_certificate(&report.certificate));
    if !summary.https {
        println!();
        print_warning("Serving plain HTTP; re-run install to request a certificate");
    }

    println!();
    println!("{}", "Manage the container:".bright_white().bold());
    for command in summary.management_commands() {
        println!("      {} {}", "$".bright_cyan(), command);
    }

    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save the API path now!".bright_yellow().bold()
    );
    println!(
        "{}",
        "Anyone who knows it can reach the backend.".bright_white()
    );
    print_info("API path", &summary.api_path);

    if warnings > 0 {
        println!();
        print_warning(&format!("Finished with {} warning(s), see above", warnings));
    } else {
        println!();
        print_success("Sub-Store is up");
    }
    println!();
}
