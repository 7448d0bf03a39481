//! Filesystem locations touched on the host
//!
//! Every path the provisioner reads or writes lives here so a run can be
//! redirected under a scratch directory (dry runs and tests).

use crate::constants::{CONTAINER_NAME, DATA_DIR, NGINX_SITE_NAME};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    pub nginx_sites_available: PathBuf,
    pub nginx_sites_enabled: PathBuf,
    pub letsencrypt_live: PathBuf,
    pub renewal_job: PathBuf,
    pub update_cron_entry: PathBuf,
    pub update_script: PathBuf,
    pub update_log: PathBuf,
    pub management_script: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for HostLayout {
    fn default() -> Self {
        Self {
            nginx_sites_available: PathBuf::from("/etc/nginx/sites-available"),
            nginx_sites_enabled: PathBuf::from("/etc/nginx/sites-enabled"),
            letsencrypt_live: PathBuf::from("/etc/letsencrypt/live"),
            renewal_job: PathBuf::from("/etc/cron.daily/certbot-renew"),
            update_cron_entry: PathBuf::from(format!("/etc/cron.d/{}-update", CONTAINER_NAME)),
            update_script: PathBuf::from(format!("/usr/local/bin/{}-update.sh", CONTAINER_NAME)),
            update_log: PathBuf::from(format!("/var/log/{}-update.log", CONTAINER_NAME)),
            management_script: PathBuf::from(format!("/usr/local/bin/{}", CONTAINER_NAME)),
            data_dir: PathBuf::from(DATA_DIR),
        }
    }
}

impl HostLayout {
    /// Re-root every default path under `root`.
    ///
    /// `/etc/nginx/sites-available` becomes `{root}/etc/nginx/sites-available`.
    pub fn rooted_at(root: &Path) -> Self {
        let base = Self::default();
        debug!("Re-rooting host layout under {}", root.display());
        Self {
            nginx_sites_available: reroot(root, &base.nginx_sites_available),
            nginx_sites_enabled: reroot(root, &base.nginx_sites_enabled),
            letsencrypt_live: reroot(root, &base.letsencrypt_live),
            renewal_job: reroot(root, &base.renewal_job),
            update_cron_entry: reroot(root, &base.update_cron_entry),
            update_script: reroot(root, &base.update_script),
            update_log: reroot(root, &base.update_log),
            management_script: reroot(root, &base.management_script),
            data_dir: reroot(root, &base.data_dir),
        }
    }

    pub fn site_available(&self) -> PathBuf {
        self.nginx_sites_available.join(NGINX_SITE_NAME)
    }

    pub fn site_enabled(&self) -> PathBuf {
        self.nginx_sites_enabled.join(NGINX_SITE_NAME)
    }

    /// Distribution default site removed so it cannot shadow ours on port 80
    pub fn default_site(&self) -> PathBuf {
        self.nginx_sites_enabled.join("default")
    }

    pub fn certificate_dir(&self, domain: &str) -> PathBuf {
        self.letsencrypt_live.join(domain)
    }

    pub fn fullchain(&self, domain: &str) -> PathBuf {
        self.certificate_dir(domain).join("fullchain.pem")
    }

    pub fn private_key(&self, domain: &str) -> PathBuf {
        self.certificate_dir(domain).join("privkey.pem")
    }

    pub fn has_certificate(&self, domain: &str) -> bool {
        self.fullchain(domain).is_file()
    }
}

fn reroot(root: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    root.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout_paths() {
        let layout = HostLayout::default();
        assert_eq!(
            layout.site_available(),
            PathBuf::from("/etc/nginx/sites-available/sub-store")
        );
        assert_eq!(
            layout.site_enabled(),
            PathBuf::from("/etc/nginx/sites-enabled/sub-store")
        );
        assert_eq!(
            layout.fullchain("example.com"),
            PathBuf::from("/etc/letsencrypt/live/example.com/fullchain.pem")
        );
        assert_eq!(
            layout.management_script,
            PathBuf::from("/usr/local/bin/sub-store")
        );
    }

    #[test]
    fn test_rooted_layout_stays_under_root() {
        let temp_dir = TempDir::new().unwrap();
        let layout = HostLayout::rooted_at(temp_dir.path());

        assert_eq!(
            layout.site_available(),
            temp_dir.path().join("etc/nginx/sites-available/sub-store")
        );
        assert_eq!(
            layout.data_dir,
            temp_dir.path().join("root/sub-store-data")
        );
        assert!(layout.update_log.starts_with(temp_dir.path()));
    }

    #[test]
    fn test_has_certificate() {
        let temp_dir = TempDir::new().unwrap();
        let layout = HostLayout::rooted_at(temp_dir.path());
        assert!(!layout.has_certificate("example.com"));

        fs::create_dir_all(layout.certificate_dir("example.com")).unwrap();
        fs::write(layout.fullchain("example.com"), "cert").unwrap();
        assert!(layout.has_certificate("example.com"));
    }
}
