use std::path::PathBuf;
use substore_host::HostError;
use substore_proxy::ProxyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{0}")]
    Privilege(String),

    #[error("Step '{step}' failed running '{command}': {output}")]
    StepFailed {
        step: String,
        command: String,
        output: String,
    },

    #[error("Container '{container}' is not running after {attempts} checks")]
    ContainerNotRunning {
        container: String,
        attempts: u32,
        logs: String,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operator input failed: {0}")]
    Interaction(String),

    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;
