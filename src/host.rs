use crate::error::HostError;

/// Source of the current host name.
pub trait HostResolver: Send + Sync {
    fn host_name(&self) -> Result<String, HostError>;
}

/// Resolves the host name through the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHostResolver;

impl HostResolver for SystemHostResolver {
    fn host_name(&self) -> Result<String, HostError> {
        gethostname::gethostname()
            .into_string()
            .map_err(HostError::NotUnicode)
    }
}

/// Always reports the same host name. Handy when the instance name should
/// stay stable regardless of where the process runs.
#[derive(Clone, Debug)]
pub struct FixedHostResolver(pub String);

impl HostResolver for FixedHostResolver {
    fn host_name(&self) -> Result<String, HostError> {
        Ok(self.0.clone())
    }
}
