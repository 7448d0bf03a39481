//! Render command: print a generated artifact without touching the host

use clap::Args;
use substore_core::{generate_api_path, DeployConfig, HostLayout, DEFAULT_PORT};
use substore_provisioner::jobs::{
    render_renewal_job, render_update_cron_entry, render_update_script,
};
use substore_provisioner::manage::render_management_script;
use substore_proxy::SiteTemplate;

/// Artifacts the installer writes to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Artifact {
    /// nginx site before a certificate exists
    NginxHttp,
    /// nginx site with TLS and the HTTP redirect
    NginxHttps,
    /// /etc/cron.daily renewal script
    RenewJob,
    /// /etc/cron.d entry for the image update
    UpdateJob,
    /// Image update script run by the cron entry
    UpdateScript,
    /// /usr/local/bin/sub-store
    ManageScript,
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Artifact::NginxHttp => write!(f, "nginx-http"),
            Artifact::NginxHttps => write!(f, "nginx-https"),
            Artifact::RenewJob => write!(f, "renew-job"),
            Artifact::UpdateJob => write!(f, "update-job"),
            Artifact::UpdateScript => write!(f, "update-script"),
            Artifact::ManageScript => write!(f, "manage-script"),
        }
    }
}

#[derive(Args)]
pub struct RenderCommand {
    /// Artifact to print
    #[arg(value_enum)]
    pub artifact: Artifact,

    /// Domain name (required for nginx sites and the update script)
    #[arg(long, env = "SUBSTORE_DOMAIN")]
    pub domain: Option<String>,

    /// Local port the container is published on
    #[arg(long, env = "SUBSTORE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Backend API path; generated when omitted
    #[arg(long, env = "SUBSTORE_API_PATH")]
    pub api_path: Option<String>,
}

impl RenderCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        print!("{}", self.render()?);
        Ok(())
    }

    fn render(&self) -> anyhow::Result<String> {
        let layout = HostLayout::default();
        let rendered = match self.artifact {
            Artifact::NginxHttp => {
                let config = self.config()?;
                SiteTemplate::new(&config.domain, config.port, &layout).render_http()
            }
            Artifact::NginxHttps => {
                let config = self.config()?;
                SiteTemplate::new(&config.domain, config.port, &layout).render_https()
            }
            Artifact::RenewJob => render_renewal_job(),
            Artifact::UpdateJob => render_update_cron_entry(&layout),
            Artifact::UpdateScript => render_update_script(&self.config()?),
            Artifact::ManageScript => render_management_script(),
        };
        Ok(rendered)
    }

    fn config(&self) -> anyhow::Result<DeployConfig> {
        let domain = self
            .domain
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("--domain is required to render {}", self.artifact))?;
        let api_path = self.api_path.clone().unwrap_or_else(generate_api_path);
        Ok(DeployConfig::new(domain, self.port, &api_path)?)
    }
}
