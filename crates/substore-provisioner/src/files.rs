use crate::error::{ProvisionError, ProvisionResult};
use std::path::Path;
use tracing::debug;

pub(crate) const EXECUTABLE_MODE: u32 = 0o755;

/// Write `contents` to `path`, creating parent directories, optionally chmod-ing
pub(crate) async fn write_file(path: &Path, contents: &str, mode: Option<u32>) -> ProvisionResult<()> {
    let wrap = |source| ProvisionError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
    }
    tokio::fs::write(path, contents).await.map_err(wrap)?;

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(wrap)?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    debug!("Wrote {}", path.display());
    Ok(())
}
