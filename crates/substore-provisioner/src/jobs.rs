//! Periodic jobs: certificate renewal and image update

use crate::container::run_arguments;
use substore_core::{DeployConfig, HostLayout, CONTAINER_NAME, IMAGE_NAME};
use substore_host::shell_quote;

/// Daily script for `/etc/cron.daily`
pub fn render_renewal_job() -> String {
    "#!/bin/sh\n\
     # Renew Let's Encrypt certificates; nginx is reloaded only when one changes\n\
     certbot renew --quiet --deploy-hook \"systemctl reload nginx\"\n"
        .to_string()
}

/// Script that pulls the image and recreates the container with the
/// same parameters as the initial launch
pub fn render_update_script(config: &DeployConfig) -> String {
    let run_line = std::iter::once("docker".to_string())
        .chain(run_arguments(config).iter().map(|a| shell_quote(a)))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"#!/bin/sh
# Pull the latest Sub-Store image and recreate the container
set -u

echo "[$(date '+%Y-%m-%d %H:%M:%S')] updating {container}"
docker pull {image} || exit 1
docker stop {container} >/dev/null 2>&1 || true
docker rm {container} >/dev/null 2>&1 || true
{run_line}
docker image prune -f >/dev/null 2>&1 || true
echo "[$(date '+%Y-%m-%d %H:%M:%S')] update finished"
"#,
        container = CONTAINER_NAME,
        image = IMAGE_NAME,
        run_line = run_line,
    )
}

/// `/etc/cron.d` entry running the update script every third day
pub fn render_update_cron_entry(layout: &HostLayout) -> String {
    format!(
        "# Sub-Store image update, every 3 days\n\
         SHELL=/bin/sh\n\
         PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin\n\
         0 4 */3 * * root {} >> {} 2>&1\n",
        layout.update_script.display(),
        layout.update_log.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renewal_job() {
        let job = render_renewal_job();
        assert!(job.starts_with("#!/bin/sh\n"));
        assert!(job.contains("certbot renew --quiet --deploy-hook \"systemctl reload nginx\""));
    }

    #[test]
    fn test_update_cron_entry() {
        let entry = render_update_cron_entry(&HostLayout::default());
        assert!(entry.ends_with(
            "0 4 */3 * * root /usr/local/bin/sub-store-update.sh >> /var/log/sub-store-update.log 2>&1\n"
        ));
    }

    #[test]
    fn test_update_script_reuses_launch_parameters() {
        let config = DeployConfig::new("example.com", 3001, "/api-XYZ").unwrap();
        let script = render_update_script(&config);

        assert!(script.contains("docker pull xream/sub-store:latest || exit 1"));
        assert!(script.contains("docker rm sub-store >/dev/null 2>&1 || true"));
        assert!(script.contains(
            "docker run -d --name sub-store --restart always \
             -e 'SUB_STORE_BACKEND_SYNC_CRON=55 23 * * *' \
             -e SUB_STORE_FRONTEND_BACKEND_PATH=/api-XYZ \
             -e SUB_STORE_BACKEND_API_URL=https://example.com/api-XYZ \
             -p 3001:3001 -v /root/sub-store-data:/opt/app/data xream/sub-store:latest\n"
        ));
    }
}
