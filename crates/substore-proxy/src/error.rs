use substore_host::HostError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("nginx configuration test failed: {output}")]
    ValidationFailed { output: String },

    #[error("nginx reload failed: {output}")]
    ReloadFailed { output: String },

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
