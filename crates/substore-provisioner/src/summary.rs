//! End-of-run summary

use serde::Serialize;
use substore_core::{DeployConfig, HostLayout};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub domain: String,
    pub https: bool,
    pub site_url: String,
    pub api_url: String,
    pub health_url: String,
    pub api_path: String,
    pub port: u16,
    pub data_dir: String,
    pub management_script: String,
}

impl Summary {
    /// URLs use https only when certbot's certificate is on disk
    pub fn new(config: &DeployConfig, layout: &HostLayout) -> Self {
        let https = layout.has_certificate(&config.domain);
        let scheme = if https { "https" } else { "http" };
        let base = format!("{}://{}", scheme, config.domain);
        Self {
            domain: config.domain.clone(),
            https,
            site_url: base.clone(),
            api_url: format!("{}{}", base, config.api_path),
            health_url: format!("{}/health", base),
            api_path: config.api_path.clone(),
            port: config.port,
            data_dir: config.data_dir.display().to_string(),
            management_script: layout.management_script.display().to_string(),
        }
    }

    /// Example invocations of the management script
    pub fn management_commands(&self) -> Vec<String> {
        crate::manage::SUBCOMMANDS
            .iter()
            .map(|sub| format!("{} {}", self.management_script, sub))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_http_urls_without_certificate() {
        let temp_dir = TempDir::new().unwrap();
        let layout = HostLayout::rooted_at(temp_dir.path());
        let config = DeployConfig::new("example.com", 3001, "/api-XYZ").unwrap();

        let summary = Summary::new(&config, &layout);

        assert!(!summary.https);
        assert_eq!(summary.site_url, "http://example.com");
        assert_eq!(summary.api_url, "http://example.com/api-XYZ");
        assert_eq!(summary.health_url, "http://example.com/health");
    }

    #[test]
    fn test_https_urls_with_certificate() {
        let temp_dir = TempDir::new().unwrap();
        let layout = HostLayout::rooted_at(temp_dir.path());
        fs::create_dir_all(layout.certificate_dir("example.com")).unwrap();
        fs::write(layout.fullchain("example.com"), "cert").unwrap();
        let config = DeployConfig::new("example.com", 3001, "/api-XYZ").unwrap();

        let summary = Summary::new(&config, &layout);

        assert!(summary.https);
        assert_eq!(summary.site_url, "https://example.com");
        assert_eq!(summary.api_url, "https://example.com/api-XYZ");
    }

    #[test]
    fn test_management_commands() {
        let config = DeployConfig::new("example.com", 3001, "/x").unwrap();
        let summary = Summary::new(&config, &HostLayout::default());
        let commands = summary.management_commands();
        assert_eq!(commands.first().unwrap(), "/usr/local/bin/sub-store start");
        assert_eq!(commands.len(), 6);
    }
}
