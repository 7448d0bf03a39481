//! Helper script installed as `/usr/local/bin/sub-store`

use substore_core::{CONTAINER_NAME, IMAGE_NAME};

const TEMPLATE: &str = r#"#!/bin/sh
# Manage the Sub-Store container
CONTAINER=@CONTAINER@
IMAGE=@IMAGE@

case "$1" in
    start)
        docker start "$CONTAINER"
        ;;
    stop)
        docker stop "$CONTAINER"
        ;;
    restart)
        docker restart "$CONTAINER"
        ;;
    status)
        docker ps -a --filter "name=^${CONTAINER}$"
        ;;
    logs)
        docker logs --tail 100 -f "$CONTAINER"
        ;;
    update)
        docker pull "$IMAGE"
        docker stop "$CONTAINER" >/dev/null 2>&1
        docker rm "$CONTAINER" >/dev/null 2>&1
        echo "Image pulled and old container removed."
        echo "Run 'substore-deploy install' again to start the new container."
        ;;
    *)
        echo "Usage: $0 {start|stop|restart|status|logs|update}"
        exit 1
        ;;
esac
"#;

/// Sub-commands understood by the script
pub const SUBCOMMANDS: &[&str] = &["start", "stop", "restart", "status", "logs", "update"];

pub fn render_management_script() -> String {
    TEMPLATE
        .replace("@CONTAINER@", CONTAINER_NAME)
        .replace("@IMAGE@", IMAGE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_covers_every_subcommand() {
        let script = render_management_script();
        for subcommand in SUBCOMMANDS {
            assert!(
                script.contains(&format!("    {})\n", subcommand)),
                "missing {subcommand}"
            );
        }
        assert!(script.contains("CONTAINER=sub-store\n"));
        assert!(script.contains("IMAGE=xream/sub-store:latest\n"));
        assert!(!script.contains('@'));
    }

    #[test]
    fn test_update_does_not_relaunch() {
        let script = render_management_script();
        let update = script
            .split("    update)")
            .nth(1)
            .and_then(|rest| rest.split(";;").next())
            .unwrap();
        assert!(update.contains("docker pull"));
        assert!(!update.contains("docker run"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unknown_subcommand_exits_with_one() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("sub-store");
        std::fs::write(&path, render_management_script()).unwrap();

        let output = std::process::Command::new("sh")
            .arg(&path)
            .arg("bogus")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stdout)
            .contains("{start|stop|restart|status|logs|update}"));
    }
}
