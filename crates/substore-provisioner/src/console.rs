//! Operator-facing side of a provisioning run

use crate::error::ProvisionError;

/// Answer to the certificate prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateRequest {
    /// Registration email; `None` registers without one
    pub email: Option<String>,
}

/// Progress reporting and the one mid-run question
pub trait Console {
    fn step(&mut self, index: usize, total: usize, title: &str);

    fn detail(&mut self, message: &str);

    fn success(&mut self, message: &str);

    fn warning(&mut self, message: &str);

    /// Ask whether to issue a certificate for `domain`; `None` skips it
    fn request_certificate(
        &mut self,
        domain: &str,
    ) -> Result<Option<CertificateRequest>, ProvisionError>;
}
