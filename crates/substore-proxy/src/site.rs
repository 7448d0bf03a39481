//! Installing the site into nginx

use crate::error::ProxyError;
use std::io::ErrorKind;
use std::sync::Arc;
use substore_core::HostLayout;
use substore_host::{CommandRunner, CommandSpec};
use tracing::{debug, info};

pub struct NginxSiteManager {
    runner: Arc<dyn CommandRunner>,
    layout: HostLayout,
}

impl NginxSiteManager {
    pub fn new(runner: Arc<dyn CommandRunner>, layout: HostLayout) -> Self {
        Self { runner, layout }
    }

    /// Write, enable, validate and reload.
    ///
    /// The reload only happens after `nginx -t` passes; a failed test is
    /// returned as [`ProxyError::ValidationFailed`] with nginx's output.
    pub async fn install(&self, contents: &str) -> Result<(), ProxyError> {
        self.write_site(contents).await?;
        self.enable_site().await?;
        self.remove_default_site().await?;
        self.validate().await?;
        self.reload().await
    }

    /// Current contents of our site file, if any
    pub async fn current_site(&self) -> Result<Option<String>, ProxyError> {
        match tokio::fs::read_to_string(self.layout.site_available()).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn write_site(&self, contents: &str) -> Result<(), ProxyError> {
        let path = self.layout.site_available();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        debug!("Wrote nginx site to {}", path.display());
        Ok(())
    }

    /// Link the site into sites-enabled unless a link is already there
    pub async fn enable_site(&self) -> Result<(), ProxyError> {
        let link = self.layout.site_enabled();
        if tokio::fs::symlink_metadata(&link).await.is_ok() {
            debug!("{} already present, leaving it", link.display());
            return Ok(());
        }
        if let Some(parent) = link.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::symlink(self.layout.site_available(), &link).await?;
        debug!("Enabled nginx site at {}", link.display());
        Ok(())
    }

    pub async fn remove_default_site(&self) -> Result<(), ProxyError> {
        let default_site = self.layout.default_site();
        match tokio::fs::remove_file(&default_site).await {
            Ok(()) => {
                info!("Removed default nginx site {}", default_site.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn validate(&self) -> Result<(), ProxyError> {
        let output = self.runner.run(&CommandSpec::new("nginx").arg("-t")).await?;
        if output.is_success() {
            debug!("nginx configuration test passed");
            Ok(())
        } else {
            Err(ProxyError::ValidationFailed {
                output: output.diagnostic(),
            })
        }
    }

    pub async fn reload(&self) -> Result<(), ProxyError> {
        let output = self
            .runner
            .run(&CommandSpec::new("systemctl").args(["reload", "nginx"]))
            .await?;
        if output.is_success() {
            info!("nginx reloaded");
            Ok(())
        } else {
            Err(ProxyError::ReloadFailed {
                output: output.diagnostic(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::SiteTemplate;
    use std::fs;
    use substore_host::testing::RecordingRunner;
    use substore_host::CommandOutput;
    use tempfile::TempDir;

    fn setup(temp_dir: &TempDir) -> (Arc<RecordingRunner>, NginxSiteManager, HostLayout) {
        let runner = Arc::new(RecordingRunner::new());
        let layout = HostLayout::rooted_at(temp_dir.path());
        let manager = NginxSiteManager::new(runner.clone(), layout.clone());
        (runner, manager, layout)
    }

    #[tokio::test]
    async fn test_install_writes_links_validates_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let (runner, manager, layout) = setup(&temp_dir);
        fs::create_dir_all(&layout.nginx_sites_enabled).unwrap();
        fs::write(layout.default_site(), "default").unwrap();

        let site = SiteTemplate::new("example.com", 3001, &layout).render_http();
        manager.install(&site).await.unwrap();

        assert_eq!(fs::read_to_string(layout.site_available()).unwrap(), site);
        assert_eq!(
            fs::read_link(layout.site_enabled()).unwrap(),
            layout.site_available()
        );
        assert!(!layout.default_site().exists());
        assert_eq!(runner.commands(), vec!["nginx -t", "systemctl reload nginx"]);
    }

    #[tokio::test]
    async fn test_existing_link_is_left_alone() {
        let temp_dir = TempDir::new().unwrap();
        let (_runner, manager, layout) = setup(&temp_dir);
        fs::create_dir_all(&layout.nginx_sites_enabled).unwrap();
        let elsewhere = temp_dir.path().join("elsewhere");
        std::os::unix::fs::symlink(&elsewhere, layout.site_enabled()).unwrap();

        manager.enable_site().await.unwrap();

        assert_eq!(fs::read_link(layout.site_enabled()).unwrap(), elsewhere);
    }

    #[tokio::test]
    async fn test_failed_validation_skips_reload() {
        let temp_dir = TempDir::new().unwrap();
        let (runner, manager, _layout) = setup(&temp_dir);
        runner.respond(
            "nginx -t",
            CommandOutput::failure(1, "nginx: [emerg] unknown directive \"proxy_pas\""),
        );

        let err = manager.install("server {}\n").await.unwrap_err();

        match err {
            ProxyError::ValidationFailed { output } => {
                assert!(output.contains("unknown directive"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.count("systemctl reload nginx"), 0);
    }

    #[tokio::test]
    async fn test_current_site() {
        let temp_dir = TempDir::new().unwrap();
        let (_runner, manager, _layout) = setup(&temp_dir);
        assert_eq!(manager.current_site().await.unwrap(), None);

        manager.write_site("server {}\n").await.unwrap();
        assert_eq!(
            manager.current_site().await.unwrap().as_deref(),
            Some("server {}\n")
        );
    }

    #[tokio::test]
    async fn test_reload_failure() {
        let temp_dir = TempDir::new().unwrap();
        let (runner, manager, _layout) = setup(&temp_dir);
        runner.respond(
            "systemctl reload",
            CommandOutput::failure(1, "nginx.service is not active"),
        );
        let err = manager.reload().await.unwrap_err();
        assert!(matches!(err, ProxyError::ReloadFailed { .. }));
    }
}
