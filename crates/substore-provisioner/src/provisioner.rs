//! The ordered provisioning sequence

use crate::console::Console;
use crate::container::ContainerLauncher;
use crate::error::{ProvisionError, ProvisionResult};
use crate::files::{write_file, EXECUTABLE_MODE};
use crate::jobs::{render_renewal_job, render_update_cron_entry, render_update_script};
use crate::manage::render_management_script;
use crate::options::{FirewallOrder, ProvisionOptions, Strictness};
use crate::summary::Summary;
use std::sync::Arc;
use substore_core::{DeployConfig, HostLayout, SYSTEM_PACKAGES};
use substore_host::{CommandRunner, CommandSpec};
use substore_proxy::{NginxSiteManager, SiteTemplate};
use tracing::{debug, info, warn};

pub const STEP_TITLES: &[&str] = &[
    "Checking privileges",
    "Installing packages",
    "Enabling services",
    "Configuring firewall",
    "Configuring nginx",
    "Issuing TLS certificate",
    "Launching container",
    "Installing certificate renewal job",
    "Installing update job",
    "Writing management script",
];

const CRON_ENTRY_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateOutcome {
    /// Certificate issued and the HTTPS site is live
    Issued,
    /// Certificate issued but the HTTPS site was rejected; HTTP site restored
    IssuedHttpOnly(String),
    /// Operator declined
    Skipped,
    /// certbot failed; HTTP site stays live
    Failed(String),
    /// Dry run: certbot was only logged, the HTTP site stays
    Simulated,
}

#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub certificate: CertificateOutcome,
    pub container_id: String,
    pub renewal_job_installed: bool,
    pub summary: Summary,
}

pub struct Provisioner {
    runner: Arc<dyn CommandRunner>,
    layout: HostLayout,
    options: ProvisionOptions,
    nginx: NginxSiteManager,
    container: ContainerLauncher,
}

impl Provisioner {
    pub fn new(runner: Arc<dyn CommandRunner>, layout: HostLayout, options: ProvisionOptions) -> Self {
        let nginx = NginxSiteManager::new(runner.clone(), layout.clone());
        let container = ContainerLauncher::new(runner.clone(), options.health_check.clone());
        Self {
            runner,
            layout,
            options,
            nginx,
            container,
        }
    }

    /// Run every step in order.
    ///
    /// Aborts on: missing privilege, nginx validation failure, image pull or
    /// container start failure, container not running. Certificate problems
    /// only warn. Package, service and firewall failures follow
    /// [`Strictness`].
    pub async fn run(
        &self,
        config: &DeployConfig,
        console: &mut dyn Console,
    ) -> ProvisionResult<ProvisionReport> {
        let total = STEP_TITLES.len();
        info!("Provisioning {} on port {}", config.domain, config.port);

        console.step(1, total, STEP_TITLES[0]);
        self.check_privilege()?;
        console.success("Running as root");

        console.step(2, total, STEP_TITLES[1]);
        self.install_packages(console).await?;

        console.step(3, total, STEP_TITLES[2]);
        self.enable_services(console).await?;

        console.step(4, total, STEP_TITLES[3]);
        self.configure_firewall(config, console).await?;

        console.step(5, total, STEP_TITLES[4]);
        self.write_proxy_config(config).await?;
        console.success("nginx site installed and reloaded");

        console.step(6, total, STEP_TITLES[5]);
        let certificate = self.issue_certificate(config, console).await?;

        console.step(7, total, STEP_TITLES[6]);
        let container_id = self.launch_container(config, console).await?;

        console.step(8, total, STEP_TITLES[7]);
        let renewal_job_installed = self.install_renewal_job(config).await?;
        if renewal_job_installed {
            console.success("Daily renewal job installed");
        } else {
            console.detail("No certificate on disk, renewal job not installed");
        }

        console.step(9, total, STEP_TITLES[8]);
        self.install_update_job(config, console).await?;

        console.step(10, total, STEP_TITLES[9]);
        self.write_management_script().await?;
        console.success(&format!(
            "Management script written to {}",
            self.layout.management_script.display()
        ));

        info!("Provisioning of {} finished", config.domain);
        Ok(ProvisionReport {
            certificate,
            container_id,
            renewal_job_installed,
            summary: Summary::new(config, &self.layout),
        })
    }

    pub fn check_privilege(&self) -> ProvisionResult<()> {
        if self.runner.is_privileged() {
            Ok(())
        } else {
            Err(ProvisionError::Privilege(
                "substore-deploy must run as root. Re-run it with sudo (e.g. `sudo substore-deploy install`)."
                    .to_string(),
            ))
        }
    }

    pub async fn install_packages(&self, console: &mut dyn Console) -> ProvisionResult<()> {
        let step = STEP_TITLES[1];
        self.run_tolerant(step, CommandSpec::new("apt-get").arg("update"), console)
            .await?;
        let installed = self
            .run_tolerant(
                step,
                CommandSpec::new("apt-get")
                    .args(["install", "-y"])
                    .args(SYSTEM_PACKAGES.iter().copied()),
                console,
            )
            .await?;
        if installed {
            console.success(&format!("Installed {}", SYSTEM_PACKAGES.join(", ")));
        }
        Ok(())
    }

    pub async fn enable_services(&self, console: &mut dyn Console) -> ProvisionResult<()> {
        for service in ["docker", "nginx"] {
            let enabled = self
                .run_tolerant(
                    STEP_TITLES[2],
                    CommandSpec::new("systemctl").args(["enable", "--now", service]),
                    console,
                )
                .await?;
            if enabled {
                console.success(&format!("{} enabled and started", service));
            }
        }
        Ok(())
    }

    pub async fn configure_firewall(
        &self,
        config: &DeployConfig,
        console: &mut dyn Console,
    ) -> ProvisionResult<()> {
        let enable = CommandSpec::new("ufw").args(["--force", "enable"]);
        let rules: Vec<CommandSpec> = [
            "ssh".to_string(),
            "80/tcp".to_string(),
            "443/tcp".to_string(),
            format!("{}/tcp", config.port),
        ]
        .into_iter()
        .map(|rule| CommandSpec::new("ufw").args(["allow".to_string(), rule]))
        .collect();

        let sequence: Vec<CommandSpec> = match self.options.firewall_order {
            FirewallOrder::EnableFirst => std::iter::once(enable).chain(rules).collect(),
            FirewallOrder::AllowSshFirst => rules.into_iter().chain(std::iter::once(enable)).collect(),
        };

        let mut all_ok = true;
        for spec in sequence {
            all_ok &= self.run_tolerant(STEP_TITLES[3], spec, console).await?;
        }
        if all_ok {
            console.success(&format!(
                "Firewall enabled; ssh, 80, 443 and {} open",
                config.port
            ));
        }
        Ok(())
    }

    /// Install the HTTP-only site
    pub async fn write_proxy_config(&self, config: &DeployConfig) -> ProvisionResult<()> {
        let site = SiteTemplate::new(&config.domain, config.port, &self.layout).render_http();
        self.nginx.install(&site).await?;
        Ok(())
    }

    pub async fn issue_certificate(
        &self,
        config: &DeployConfig,
        console: &mut dyn Console,
    ) -> ProvisionResult<CertificateOutcome> {
        let Some(request) = console.request_certificate(&config.domain)? else {
            console.detail("Certificate skipped, serving plain HTTP");
            return Ok(CertificateOutcome::Skipped);
        };

        let mut certbot = CommandSpec::new("certbot").args([
            "certonly",
            "--nginx",
            "-d",
            config.domain.as_str(),
            "--non-interactive",
            "--agree-tos",
        ]);
        certbot = match request.email.or_else(|| config.email.clone()) {
            Some(email) => certbot.args(["--email".to_string(), email]),
            None => certbot.arg("--register-unsafely-without-email"),
        };

        let failure = match self.runner.run(&certbot).await {
            Ok(output) if output.is_success() => None,
            Ok(output) => Some(output.diagnostic()),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = failure {
            warn!("certbot failed for {}: {}", config.domain, reason);
            console.warning(&format!(
                "Certificate issuance failed, keeping HTTP-only site: {}",
                reason
            ));
            return Ok(CertificateOutcome::Failed(reason));
        }

        if self.runner.is_simulated() {
            console.detail("Dry run, no certificate was issued; keeping the HTTP site");
            return Ok(CertificateOutcome::Simulated);
        }

        if !self.layout.has_certificate(&config.domain) {
            let reason = format!(
                "certbot reported success but {} is missing",
                self.layout.fullchain(&config.domain).display()
            );
            console.warning(&format!("{}, keeping HTTP-only site", reason));
            return Ok(CertificateOutcome::IssuedHttpOnly(reason));
        }

        let template = SiteTemplate::new(&config.domain, config.port, &self.layout);
        let previous = self.nginx.current_site().await?;
        match self.nginx.install(&template.render_https()).await {
            Ok(()) => {
                console.success(&format!("Certificate issued, HTTPS enabled for {}", config.domain));
                Ok(CertificateOutcome::Issued)
            }
            Err(e) => {
                warn!("HTTPS site rejected, restoring HTTP site: {}", e);
                console.warning(&format!("HTTPS site rejected, restoring HTTP site: {}", e));
                let fallback = previous.unwrap_or_else(|| template.render_http());
                self.nginx.install(&fallback).await?;
                Ok(CertificateOutcome::IssuedHttpOnly(e.to_string()))
            }
        }
    }

    pub async fn launch_container(
        &self,
        config: &DeployConfig,
        console: &mut dyn Console,
    ) -> ProvisionResult<String> {
        let container_id = self.container.launch(config).await?;
        if self.runner.is_simulated() {
            console.detail("Dry run, liveness check skipped");
        } else {
            console.detail("Waiting for the container to report running");
            self.container.wait_until_running().await?;
        }
        console.success("Container is running");
        Ok(container_id)
    }

    /// Returns whether the job was written (only when a certificate exists)
    pub async fn install_renewal_job(&self, config: &DeployConfig) -> ProvisionResult<bool> {
        if !self.layout.has_certificate(&config.domain) {
            debug!("No certificate for {}, skipping renewal job", config.domain);
            return Ok(false);
        }
        write_file(
            &self.layout.renewal_job,
            &render_renewal_job(),
            Some(EXECUTABLE_MODE),
        )
        .await?;
        Ok(true)
    }

    pub async fn install_update_job(
        &self,
        config: &DeployConfig,
        console: &mut dyn Console,
    ) -> ProvisionResult<()> {
        write_file(
            &self.layout.update_script,
            &render_update_script(config),
            Some(EXECUTABLE_MODE),
        )
        .await?;
        write_file(
            &self.layout.update_cron_entry,
            &render_update_cron_entry(&self.layout),
            Some(CRON_ENTRY_MODE),
        )
        .await?;

        // a stale scheduler only delays the first update, never fatal
        let restart = CommandSpec::new("systemctl").args(["restart", "cron"]);
        match self.runner.run(&restart).await {
            Ok(output) if output.is_success() => {
                console.success("Update job installed, runs every 3 days");
            }
            Ok(output) => {
                console.warning(&format!("Could not restart cron: {}", output.diagnostic()))
            }
            Err(e) => console.warning(&format!("Could not restart cron: {}", e)),
        }
        Ok(())
    }

    pub async fn write_management_script(&self) -> ProvisionResult<()> {
        write_file(
            &self.layout.management_script,
            &render_management_script(),
            Some(EXECUTABLE_MODE),
        )
        .await
    }

    /// Run a command whose failure is governed by [`Strictness`].
    ///
    /// Returns `Ok(false)` when the command failed and the run continues.
    async fn run_tolerant(
        &self,
        step: &str,
        spec: CommandSpec,
        console: &mut dyn Console,
    ) -> ProvisionResult<bool> {
        let failure = match self.runner.run(&spec).await {
            Ok(output) if output.is_success() => return Ok(true),
            Ok(output) => output.diagnostic(),
            Err(e) => e.to_string(),
        };

        match self.options.strictness {
            Strictness::Strict => Err(ProvisionError::StepFailed {
                step: step.to_string(),
                command: spec.command_line(),
                output: failure,
            }),
            Strictness::BestEffort => {
                warn!("'{}' failed during '{}': {}", spec, step, failure);
                console.warning(&format!("'{}' failed, continuing: {}", spec, failure));
                Ok(false)
            }
        }
    }
}
