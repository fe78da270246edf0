//! Credential resolution.
//!
//! Every provider needs exactly one static secret, looked up by environment
//! variable name at the moment a dataset using that provider is fetched.
//! An absent or empty variable is a fatal configuration error and is never retried.

use std::collections::HashMap;

/// Credential lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Environment variable missing or empty
    #[error("{0} is not set! Check your .env file.")]
    Missing(String),
}

/// Source of named secrets.
pub trait CredentialSource: Send + Sync {
    /// Raw lookup; `None` when the name is unknown.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl CredentialSource for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolve a secret, failing fast when it is absent or blank.
pub fn resolve(source: &dyn CredentialSource, name: &str) -> Result<String, CredentialError> {
    match source.lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CredentialError::Missing(name.to_string())),
    }
}
